// Receipt Log Converter - Core Library
// App event log → receipts → CSV report. Used by the CLI and the tests.

pub mod deduplication;
pub mod errors;
pub mod keys;
pub mod normalize;
pub mod parser;
pub mod reassembler;
pub mod receipt;
pub mod reconciliation;
pub mod report;

use std::sync::Once;

// Re-export commonly used types
pub use deduplication::{remove_duplicates, sort_receipts, SortOrder};
pub use errors::ParseError;
pub use keys::{FieldKind, KeyConfig, KeyRegistry};
pub use normalize::{normalize_price, normalize_timestamp, normalize_total};
pub use parser::{parse_line_items, split_key_values, Extracted, ReceiptParser};
pub use reassembler::{
    parse_log, parse_log_file, process_record, reassemble, LogRecord, ParseSummary, ParsedLog,
    RecordOutcome, RecordReader, SkipReason,
};
pub use receipt::{LineItem, Receipt};
pub use reconciliation::is_reconciled;
pub use report::{build_report, convert_logs_to_csv, to_csv, write_csv_file, ConvertOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber (once per process)
///
/// `RUST_LOG` wins when set; otherwise this crate logs at `info`, or at
/// `debug` when `verbose` is true.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let default_level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("receipt_log_converter={}", default_level))
        });

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}
