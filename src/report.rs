// 📊 Reporter - receipts → CSV
// One row per (receipt × line item); receipts without items produce no rows

use crate::deduplication::{remove_duplicates, sort_receipts, SortOrder};
use crate::keys::KeyRegistry;
use crate::parser::ReceiptParser;
use crate::reassembler::parse_log_file;
use crate::receipt::Receipt;
use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_HEADER: [&str; 14] = [
    "LogLine",
    "Date",
    "Title",
    "Name",
    "Total",
    "Currency",
    "Merchant",
    "Category",
    "Description",
    "IsReconciled",
    "ItemName",
    "Quantity",
    "PricePerUnit",
    "TotalPrice",
];

// ============================================================================
// CONVERT OPTIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub log_file: PathBuf,

    /// Where to persist the CSV; `None` only returns it
    pub csv_file: Option<PathBuf>,

    pub remove_duplicates: bool,
    pub sort_order: SortOrder,
    pub registry: KeyRegistry,
}

impl ConvertOptions {
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        ConvertOptions {
            log_file: log_file.into(),
            csv_file: None,
            remove_duplicates: false,
            sort_order: SortOrder::Parsed,
            registry: KeyRegistry::new(),
        }
    }

    /// Builder pattern: persist the CSV to this file
    pub fn with_csv_file(mut self, csv_file: impl Into<PathBuf>) -> Self {
        self.csv_file = Some(csv_file.into());
        self
    }

    /// Builder pattern: collapse duplicate receipts
    pub fn with_remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = remove;
        self
    }

    pub fn with_sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn with_registry(mut self, registry: KeyRegistry) -> Self {
        self.registry = registry;
        self
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Serialize receipts to CSV text
///
/// Fields holding a comma (or a quote or newline) are quoted; booleans are
/// written as `true` / `false`.
pub fn to_csv(receipts: &[Receipt]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;

    for receipt in receipts {
        let line_number = receipt.line_number.to_string();
        let is_reconciled = receipt.is_reconciled.to_string();

        for item in &receipt.line_items {
            let row: [&str; 14] = [
                &line_number,
                &receipt.date,
                &receipt.title,
                &receipt.name,
                &receipt.total,
                &receipt.currency,
                &receipt.merchant,
                &receipt.category,
                &receipt.description,
                &is_reconciled,
                &item.name,
                &item.quantity,
                &item.price_per_unit,
                &item.total_price,
            ];
            writer
                .write_record(row)
                .with_context(|| format!("Failed to write CSV row for log line {}", line_number))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e.error()))?;

    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Persist CSV text
pub fn write_csv_file(csv: &str, path: &Path) -> Result<()> {
    fs::write(path, csv)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))
}

/// Dedup (optional) → sort → CSV
pub fn build_report(mut receipts: Vec<Receipt>, options: &ConvertOptions) -> Result<String> {
    if options.remove_duplicates {
        let before = receipts.len();
        receipts = remove_duplicates(receipts);
        info!(removed = before - receipts.len(), "duplicate receipts removed");
    }

    sort_receipts(&mut receipts, options.sort_order);
    to_csv(&receipts)
}

/// Full pipeline: log file → receipts → CSV (returned, and written when
/// `csv_file` is set)
///
/// An unreadable log aborts before anything is written.
pub fn convert_logs_to_csv(options: &ConvertOptions) -> Result<String> {
    let parser = ReceiptParser::with_registry(options.registry.clone());
    let parsed = parse_log_file(&options.log_file, &parser)?;

    let csv = build_report(parsed.receipts, options)?;

    if let Some(csv_file) = &options.csv_file {
        write_csv_file(&csv, csv_file)?;
        info!(path = %csv_file.display(), "CSV written");
    }

    Ok(csv)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::LineItem;

    fn create_test_receipt(line_number: usize, merchant: &str, items: Vec<LineItem>) -> Receipt {
        Receipt {
            line_number,
            date: "2024-03-28".to_string(),
            total: "9.90".to_string(),
            currency: "AUD".to_string(),
            merchant: merchant.to_string(),
            is_receipt: true,
            is_reconciled: true,
            line_items: items,
            ..Receipt::default()
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "LogLine,Date,Title,Name,Total,Currency,Merchant,Category,Description,\
             IsReconciled,ItemName,Quantity,PricePerUnit,TotalPrice\n"
        );
    }

    #[test]
    fn test_one_row_per_item() {
        let receipt = create_test_receipt(
            12,
            "Foo",
            vec![
                LineItem::new("Widget", "1", "0.00", "4.90"),
                LineItem::new("Gadget", "2", "2.50", "5.00"),
            ],
        );

        let csv = to_csv(&[receipt]).unwrap();
        let rows: Vec<&str> = csv.lines().skip(1).collect();

        assert_eq!(
            rows,
            vec![
                "12,2024-03-28,,,9.90,AUD,Foo,,,true,Widget,1,0.00,4.90",
                "12,2024-03-28,,,9.90,AUD,Foo,,,true,Gadget,2,2.50,5.00",
            ]
        );
    }

    #[test]
    fn test_receipt_without_items_has_no_rows() {
        let csv = to_csv(&[create_test_receipt(1, "Foo", vec![])]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_comma_fields_quoted() {
        let receipt = create_test_receipt(
            3,
            "Coles, Pty Ltd",
            vec![LineItem::new("WIDGET, LARGE", "1", "0.00", "9.90")],
        );

        let csv = to_csv(&[receipt]).unwrap();

        assert!(csv.contains(",\"Coles, Pty Ltd\","));
        assert!(csv.contains(",\"WIDGET, LARGE\","));
    }

    #[test]
    fn test_quote_fields_quoted_and_doubled() {
        let receipt = create_test_receipt(
            4,
            "Foo",
            vec![LineItem::new("5\" TV", "1", "0.00", "9.90")],
        );

        let csv = to_csv(&[receipt]).unwrap();

        assert_eq!(
            csv.lines().nth(1),
            Some("4,2024-03-28,,,9.90,AUD,Foo,,,true,\"5\"\" TV\",1,0.00,9.90")
        );
    }

    #[test]
    fn test_build_report_dedup_and_sort() {
        let item = || vec![LineItem::new("Widget", "1", "0.00", "9.90")];
        let receipts = vec![
            create_test_receipt(8, "Foo", item()),
            create_test_receipt(2, "Bar", item()),
            create_test_receipt(5, "Foo", item()),
        ];

        let options = ConvertOptions::new("unused.log")
            .with_remove_duplicates(true)
            .with_sort_order(SortOrder::LogLine);
        let csv = build_report(receipts, &options).unwrap();
        let first_column: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|row| row.split(',').next().unwrap())
            .collect();

        assert_eq!(first_column, vec!["2", "8"]);
    }

    #[test]
    fn test_convert_missing_log_fails() {
        let options = ConvertOptions::new("no/such/file.log");
        assert!(convert_logs_to_csv(&options).is_err());
    }
}
