// 🔢 Value Normalizers
// Raw log values → canonical strings (dates, totals, cents prices)

use crate::errors::ParseError;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Convert an epoch-millisecond timestamp to `YYYY-MM-DD` (UTC)
///
/// The last three characters are dropped to get epoch seconds. Anything
/// that does not parse gives an empty date and a warning; a bad date never
/// abandons the record.
///
/// ```
/// use receipt_log_converter::normalize::normalize_timestamp;
/// assert_eq!(normalize_timestamp("1711627200000"), "2024-03-28");
/// ```
pub fn normalize_timestamp(millis: &str) -> String {
    let millis = millis.trim();

    let seconds = match millis
        .char_indices()
        .rev()
        .nth(2)
        .map(|(idx, _)| &millis[..idx])
    {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!(value = millis, "timestamp too short to hold epoch milliseconds");
            return String::new();
        }
    };

    let seconds: i64 = match seconds.parse() {
        Ok(s) => s,
        Err(e) => {
            warn!(value = millis, error = %e, "failed to parse unix time");
            return String::new();
        }
    };

    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(datetime) => datetime.format("%Y-%m-%d").to_string(),
        None => {
            warn!(value = millis, "unix time out of range");
            String::new()
        }
    }
}

/// Canonicalize a receipt total: strip `$` and thousands separators,
/// force two digits after the decimal point
///
/// - `"29.9"` → `"29.90"`
/// - `"$1,234"` → `"1234.00"`
/// - `"5."` → `"5.00"`
/// - already canonical values come back unchanged
pub fn normalize_total(total: &str) -> String {
    let mut total = total.trim().replace(['$', ','], "");

    if total.is_empty() {
        return "0.00".to_string();
    }

    // Only the first '.' counts; anything odd after it is left alone
    match total.split('.').nth(1).map(str::len) {
        None => total.push_str(".00"),
        Some(0) => total.push_str("00"),
        Some(1) => total.push('0'),
        Some(_) => {}
    }

    total
}

/// Convert a cents-integer price to a 2-decimal string
///
/// `"990"` → `"9.90"`, `""` → `"0.00"`. Non-numeric input abandons the
/// record.
pub fn normalize_price(price: &str) -> Result<String, ParseError> {
    let price = price.trim().replace('$', "");

    if price.is_empty() {
        return Ok("0.00".to_string());
    }

    let cents: f64 = price.parse().map_err(|source| ParseError::InvalidPrice {
        value: price.clone(),
        source,
    })?;

    Ok(format!("{:.2}", cents / 100.0))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_known_instant() {
        assert_eq!(normalize_timestamp("1711627200000"), "2024-03-28");
    }

    #[test]
    fn test_timestamp_epoch() {
        assert_eq!(normalize_timestamp("0000"), "1970-01-01");
    }

    #[test]
    fn test_timestamp_surrounding_whitespace() {
        assert_eq!(normalize_timestamp(" 1711627200000 "), "2024-03-28");
    }

    #[test]
    fn test_timestamp_non_numeric_gives_empty_date() {
        assert_eq!(normalize_timestamp("yesterday"), "");
    }

    #[test]
    fn test_timestamp_too_short_gives_empty_date() {
        assert_eq!(normalize_timestamp(""), "");
        assert_eq!(normalize_timestamp("123"), "");
    }

    #[test]
    fn test_total_pads_decimals() {
        assert_eq!(normalize_total("29.9"), "29.90");
        assert_eq!(normalize_total("29."), "29.00");
        assert_eq!(normalize_total("29"), "29.00");
    }

    #[test]
    fn test_total_strips_currency_formatting() {
        assert_eq!(normalize_total("$9.90"), "9.90");
        assert_eq!(normalize_total("$1,234.5"), "1234.50");
    }

    #[test]
    fn test_total_idempotent_on_canonical_values() {
        for canonical in ["0.00", "9.90", "29.90", "1234.56"] {
            assert_eq!(normalize_total(canonical), canonical);
            assert_eq!(normalize_total(&normalize_total(canonical)), canonical);
        }
    }

    #[test]
    fn test_total_empty() {
        assert_eq!(normalize_total(""), "0.00");
    }

    #[test]
    fn test_price_cents_to_dollars() {
        assert_eq!(normalize_price("990").unwrap(), "9.90");
        assert_eq!(normalize_price("2000").unwrap(), "20.00");
        assert_eq!(normalize_price(" $150 ").unwrap(), "1.50");
    }

    #[test]
    fn test_price_empty_is_zero() {
        assert_eq!(normalize_price("").unwrap(), "0.00");
        assert_eq!(normalize_price("   ").unwrap(), "0.00");
    }

    #[test]
    fn test_price_non_numeric_is_error() {
        let err = normalize_price("ten").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPrice { ref value, .. } if value == "ten"));
    }
}
