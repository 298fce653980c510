use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use receipt_log_converter::{
    convert_logs_to_csv, init_tracing, ConvertOptions, KeyRegistry, SortOrder,
};

const DEFAULT_LOGFILE: &str = "logfile.log";

#[derive(Parser)]
#[command(
    name = "receipt-log-converter",
    version,
    about = "Convert an app event log into a CSV report of purchase receipts"
)]
struct Cli {
    /// Log file to convert; the CSV is written next to it as <stem>.csv
    #[arg(default_value = DEFAULT_LOGFILE)]
    logfile: PathBuf,

    /// Keep only the latest receipt per (date, total, merchant)
    #[arg(long)]
    remove_duplicates: bool,

    /// Order rows by receipt date
    #[arg(long, conflicts_with = "sort_by_line")]
    sort_by_date: bool,

    /// Order rows by the log line each receipt started on
    #[arg(long)]
    sort_by_line: bool,

    /// Print the CSV to stdout instead of writing <stem>.csv
    #[arg(long)]
    stdout: bool,

    /// JSON file with extra property keys to ignore: {"ignored": [...]}
    #[arg(long, value_name = "FILE")]
    ignore_keys: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

/// `logs/app.txt` → (`logs/app.log`, `logs/app.csv`)
fn derive_paths(logfile: &Path) -> (PathBuf, PathBuf) {
    (logfile.with_extension("log"), logfile.with_extension("csv"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (log_path, csv_path) = derive_paths(&cli.logfile);
    tracing::info!(log = %log_path.display(), "using log file");

    let registry = match &cli.ignore_keys {
        Some(path) => KeyRegistry::from_file(path)?,
        None => KeyRegistry::new(),
    };

    let sort_order = if cli.sort_by_date {
        SortOrder::Date
    } else if cli.sort_by_line {
        SortOrder::LogLine
    } else {
        SortOrder::Parsed
    };

    let mut options = ConvertOptions::new(log_path)
        .with_remove_duplicates(cli.remove_duplicates)
        .with_sort_order(sort_order)
        .with_registry(registry);

    if !cli.stdout {
        options = options.with_csv_file(csv_path);
    }

    let csv = convert_logs_to_csv(&options)?;

    if cli.stdout {
        print!("{}", csv);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_derive_paths() {
        let (log, csv) = derive_paths(Path::new("logs/app.log"));
        assert_eq!(log, PathBuf::from("logs/app.log"));
        assert_eq!(csv, PathBuf::from("logs/app.csv"));

        let (log, csv) = derive_paths(Path::new("export"));
        assert_eq!(log, PathBuf::from("export.log"));
        assert_eq!(csv, PathBuf::from("export.csv"));
    }

    #[test]
    fn test_default_logfile() {
        let cli = Cli::parse_from(["receipt-log-converter"]);
        assert_eq!(cli.logfile, PathBuf::from(DEFAULT_LOGFILE));
        assert!(!cli.remove_duplicates);
    }

    #[test]
    fn test_sort_flags_conflict() {
        let result =
            Cli::try_parse_from(["receipt-log-converter", "--sort-by-date", "--sort-by-line"]);
        assert!(result.is_err());
    }
}
