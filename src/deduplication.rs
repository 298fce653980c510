// 🔍 Deduplication + ordering of parsed receipts
// The app re-logs a receipt every time it is edited; keep only the latest.

use crate::receipt::Receipt;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;

// ============================================================================
// DEDUPLICATION
// ============================================================================

/// Collapse receipts sharing (date, total, merchant) into one
///
/// The receipt with the highest log line wins. Output keeps the order in
/// which each key was first seen, so runs are reproducible.
pub fn remove_duplicates(receipts: Vec<Receipt>) -> Vec<Receipt> {
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Receipt> = Vec::new();

    for receipt in receipts {
        let key = receipt.dedup_key();

        match slot_by_key.get(&key) {
            Some(&slot) => {
                if receipt.line_number > kept[slot].line_number {
                    kept[slot] = receipt;
                }
            }
            None => {
                slot_by_key.insert(key, kept.len());
                kept.push(receipt);
            }
        }
    }

    kept
}

// ============================================================================
// SORTING
// ============================================================================

/// Report row order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Order the records appeared in the log
    #[default]
    Parsed,
    /// Receipt date ascending
    Date,
    /// Starting log line ascending
    LogLine,
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Receipts without a usable date sort before every dated one
fn compare_dates(a: &Receipt, b: &Receipt) -> Ordering {
    parse_date(&a.date).cmp(&parse_date(&b.date))
}

/// Stable sort; ties keep their current relative order
pub fn sort_receipts(receipts: &mut [Receipt], order: SortOrder) {
    match order {
        SortOrder::Parsed => {}
        SortOrder::Date => receipts.sort_by(compare_dates),
        SortOrder::LogLine => receipts.sort_by_key(|r| r.line_number),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_receipt(line_number: usize, date: &str, total: &str, merchant: &str) -> Receipt {
        Receipt {
            line_number,
            date: date.to_string(),
            total: total.to_string(),
            merchant: merchant.to_string(),
            is_receipt: true,
            ..Receipt::default()
        }
    }

    fn lines(receipts: &[Receipt]) -> Vec<usize> {
        receipts.iter().map(|r| r.line_number).collect()
    }

    #[test]
    fn test_duplicates_keep_highest_line() {
        let receipts = vec![
            create_test_receipt(3, "2024-03-28", "29.90", "Coles"),
            create_test_receipt(10, "2024-03-27", "5.00", "Aldi"),
            create_test_receipt(25, "2024-03-28", "29.90", "Coles"),
        ];

        let kept = remove_duplicates(receipts);

        assert_eq!(lines(&kept), vec![25, 10]);
    }

    #[test]
    fn test_duplicates_out_of_order_lines() {
        let receipts = vec![
            create_test_receipt(40, "2024-03-28", "29.90", "Coles"),
            create_test_receipt(3, "2024-03-28", "29.90", "Coles"),
        ];

        assert_eq!(lines(&remove_duplicates(receipts)), vec![40]);
    }

    #[test]
    fn test_no_duplicates_untouched() {
        let receipts = vec![
            create_test_receipt(1, "2024-03-28", "29.90", "Coles"),
            create_test_receipt(2, "2024-03-28", "29.90", "Woolworths"),
            create_test_receipt(3, "2024-03-28", "9.90", "Coles"),
        ];

        assert_eq!(lines(&remove_duplicates(receipts)), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_date() {
        let mut receipts = vec![
            create_test_receipt(1, "2024-03-28", "1.00", "A"),
            create_test_receipt(2, "2023-12-01", "1.00", "B"),
            create_test_receipt(3, "", "1.00", "C"),
            create_test_receipt(4, "2024-03-28", "2.00", "D"),
        ];

        sort_receipts(&mut receipts, SortOrder::Date);

        assert_eq!(lines(&receipts), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_sort_by_log_line() {
        let mut receipts = vec![
            create_test_receipt(9, "2024-03-28", "1.00", "A"),
            create_test_receipt(2, "2023-12-01", "1.00", "B"),
            create_test_receipt(5, "2024-01-01", "1.00", "C"),
        ];

        sort_receipts(&mut receipts, SortOrder::LogLine);

        assert_eq!(lines(&receipts), vec![2, 5, 9]);
    }

    #[test]
    fn test_sort_parsed_keeps_order() {
        let mut receipts = vec![
            create_test_receipt(9, "2024-03-28", "1.00", "A"),
            create_test_receipt(2, "2023-12-01", "1.00", "B"),
        ];

        sort_receipts(&mut receipts, SortOrder::Parsed);

        assert_eq!(lines(&receipts), vec![9, 2]);
    }
}
