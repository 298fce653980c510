// 🏗️ Receipt Parser
// Property block → key/value pairs → Receipt + LineItems
//
// The app logs purchases like this (one logical record, newlines added):
//
//   props: {
//        date=1711627200000,
//        total=29.9,
//        currency=AUD,
//        merchant=Coles Supermarkets Australia Pty Ltd coles,
//        category=,
//        receipt=true,
//        items=
//            1_Item
//                name: WELLNESS ROAD LINSEE 500GRAM 3 @ $3.30 EACH,
//                quantity: 0.0,
//                pricePerUnit: ,
//                totalPrice: 990
//            2_Item
//                name: % TULIPS 1EACH,
//                quantity: 0.0,
//                pricePerUnit: ,
//                totalPrice: 2000,
//        first_event=true
//   }
//
// Keys come in any order, and `items` holds commas of its own, so the block
// cannot simply be split on ','.

use crate::errors::ParseError;
use crate::keys::{FieldKind, FlagField, KeyRegistry, TextField};
use crate::normalize::{normalize_price, normalize_timestamp, normalize_total};
use crate::receipt::{LineItem, Receipt};
use crate::reconciliation::is_reconciled;
use regex::Regex;
use std::sync::OnceLock;

/// Value that marks a record the app had not finished writing
pub const IN_PROGRESS: &str = "in progress";

const ITEM_MARKER: &str = "_Item";

fn props_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"props:\s*\{").expect("props marker regex is valid"))
}

// ============================================================================
// KEY-VALUE SPLITTER
// ============================================================================

/// Start of the key that ends at `end`: the text after the last divider or
/// whitespace in `text[floor..end]`
fn key_start(text: &str, floor: usize, end: usize, divider: char) -> usize {
    text[floor..end]
        .char_indices()
        .rev()
        .find(|(_, c)| *c == divider || c.is_whitespace())
        .map_or(floor, |(idx, c)| floor + idx + c.len_utf8())
}

fn clean_value(raw: &str, divider: char) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == divider || c.is_whitespace())
        .to_string()
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(pair) => pair.1 = value,
        None => pairs.push((key, value)),
    }
}

/// Split `key1=value1, key2=value2, ...` into ordered `(key, value)` pairs
///
/// One forward scan over assigner positions. The key is the whole token
/// right before each assigner (everything back to the last divider or
/// whitespace), and the previous value ends where that key starts, so
/// dividers inside a value (the `items` blob, a merchant name with commas)
/// are kept. A key like `receipt-total` stays whole and is never mistaken
/// for `total`. Values are trimmed of whitespace
/// and trailing dividers. Text before the first key is dropped. A repeated
/// key keeps its first position and its last value.
///
/// ```
/// use receipt_log_converter::parser::split_key_values;
///
/// let pairs = split_key_values("merchant=Foo, Bar, total=1.00", '=', ',');
/// assert_eq!(pairs[0], ("merchant".to_string(), "Foo, Bar".to_string()));
/// assert_eq!(pairs[1], ("total".to_string(), "1.00".to_string()));
/// ```
pub fn split_key_values(text: &str, assigner: char, divider: char) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    // key being read + byte offset where its value starts
    let mut current: Option<(String, usize)> = None;

    for (pos, ch) in text.char_indices() {
        if ch != assigner {
            continue;
        }

        let floor = current.as_ref().map_or(0, |(_, value_start)| *value_start);
        let start = key_start(text, floor, pos, divider);

        if let Some((key, value_start)) = current.take() {
            upsert(&mut pairs, key, clean_value(&text[value_start..start], divider));
        }

        current = Some((text[start..pos].to_string(), pos + ch.len_utf8()));
    }

    if let Some((key, value_start)) = current {
        upsert(&mut pairs, key, clean_value(&text[value_start..], divider));
    }

    pairs
}

// ============================================================================
// LINE-ITEM PARSER
// ============================================================================

/// Parse the `items` blob: `1_Item name: .., quantity: .., 2_Item ...`
///
/// Splitting on `_Item` leaves the next item's ordinal stuck to the end of
/// each segment. It is trimmed as a character class (every trailing char
/// that occurs in the ordinal's digits), which is what the app's logs have
/// always needed; item counts of 10 or more have never been seen.
pub fn parse_line_items(items: &str) -> Result<Vec<LineItem>, ParseError> {
    let segments: Vec<&str> = items.split(ITEM_MARKER).collect();
    let last = segments.len() - 1;

    let mut line_items = Vec::new();

    for (i, segment) in segments.into_iter().enumerate() {
        if i == 0 && segment == "1" {
            continue;
        }
        if segment.is_empty() {
            continue;
        }

        let segment = if i > 0 && i < last {
            let ordinal = (i + 1).to_string();
            segment.trim_end_matches(|c: char| ordinal.contains(c))
        } else {
            segment
        };

        line_items.push(parse_line_item(segment)?);
    }

    Ok(line_items)
}

/// Parse one `name: .., quantity: .., pricePerUnit: .., totalPrice: ..` run
fn parse_line_item(segment: &str) -> Result<LineItem, ParseError> {
    let mut item = LineItem::default();

    for (key, value) in split_key_values(segment, ':', ',') {
        match key.as_str() {
            "name" => item.name = value,
            "quantity" => item.quantity = value,
            "pricePerUnit" => item.price_per_unit = normalize_price(&value)?,
            "totalPrice" => item.total_price = normalize_price(&value)?,
            _ => return Err(ParseError::UnknownKey(key)),
        }
    }

    Ok(item)
}

// ============================================================================
// RECEIPT PARSER
// ============================================================================

/// What a record's property block turned into
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Receipt(Receipt),

    /// No `props: {` marker; most log records are not purchases
    NoProperties,

    /// A value was `in progress`; the app logs the receipt again later
    InProgress,
}

/// Take the text after `props: {`, minus the closing brace
pub fn extract_properties(record: &str) -> Option<String> {
    let record = record.replace(['\r', '\n'], "");
    let marker = props_marker().find(&record)?;

    let props = record[marker.end()..].trim_end().trim_end_matches('}');
    Some(props.to_string())
}

pub struct ReceiptParser {
    registry: KeyRegistry,
}

impl ReceiptParser {
    pub fn new() -> Self {
        ReceiptParser {
            registry: KeyRegistry::new(),
        }
    }

    pub fn with_registry(registry: KeyRegistry) -> Self {
        ReceiptParser { registry }
    }

    /// Parse one logical log record
    ///
    /// `line_number` is left at 0; the reassembler owns it.
    pub fn parse_record(&self, record: &str) -> Result<Extracted, ParseError> {
        let props = match extract_properties(record) {
            Some(props) => props,
            None => return Ok(Extracted::NoProperties),
        };

        let pairs = split_key_values(&props, '=', ',');

        if pairs.iter().any(|(_, value)| value == IN_PROGRESS) {
            return Ok(Extracted::InProgress);
        }

        let mut receipt = Receipt::default();

        for (key, value) in pairs {
            let kind = self
                .registry
                .classify(&key)
                .ok_or_else(|| ParseError::UnknownKey(key.clone()))?;

            match kind {
                FieldKind::Date => receipt.date = normalize_timestamp(&value),
                FieldKind::Total => receipt.total = normalize_total(&value),
                FieldKind::Text(field) => {
                    let slot = match field {
                        TextField::Currency => &mut receipt.currency,
                        TextField::Merchant => &mut receipt.merchant,
                        TextField::Category => &mut receipt.category,
                        TextField::Description => &mut receipt.description,
                        TextField::Title => &mut receipt.title,
                        TextField::Name => &mut receipt.name,
                    };
                    *slot = value;
                }
                FieldKind::Flag(FlagField::Receipt) => receipt.is_receipt = value == "true",
                FieldKind::Flag(FlagField::FirstEvent) => {
                    receipt.is_first_event = value == "true"
                }
                FieldKind::Items => receipt.line_items.extend(parse_line_items(&value)?),
                FieldKind::Ignored => {}
            }
        }

        receipt.is_reconciled = is_reconciled(&receipt);
        Ok(Extracted::Receipt(receipt))
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
