// 📜 Record Reassembler
// Physical log lines → logical records → receipts
//
// A record starts on a line beginning with a DD-MM-YYYY stamp; every other
// line continues the current record.

use crate::errors::ParseError;
use crate::parser::{Extracted, ReceiptParser};
use crate::receipt::Receipt;
use crate::reconciliation::difference;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs::File;
use std::borrow::Cow;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, error, info, warn};

fn date_stamp() -> &'static Regex {
    static STAMP: OnceLock<Regex> = OnceLock::new();
    STAMP.get_or_init(|| {
        Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}").expect("date stamp regex is valid")
    })
}

/// Does this line open a new logical record?
pub fn starts_record(line: &str) -> bool {
    date_stamp().is_match(line)
}

// ============================================================================
// LOG RECORD
// ============================================================================

/// One logical record: continuation lines joined with single spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// 1-based line that started the record
    pub line_number: usize,
    pub text: String,
}

/// Lines gathered so far for the record being read
struct PendingRecord {
    line_number: usize,
    lines: Vec<String>,
}

impl PendingRecord {
    fn finish(self) -> Option<LogRecord> {
        let text = self.lines.join(" ");
        if text.trim().is_empty() {
            return None;
        }
        Some(LogRecord {
            line_number: self.line_number,
            text,
        })
    }
}

/// Streams `LogRecord`s out of a line-oriented reader
///
/// Single forward pass; a read error is yielded once and ends the stream.
/// Bytes that are not valid UTF-8 become U+FFFD, so they can spoil a field
/// of one record but never the read.
pub struct RecordReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    pending: Option<PendingRecord>,
    failed: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader {
            reader,
            buf: Vec::new(),
            line_number: 0,
            pending: None,
            failed: false,
        }
    }

    /// Next physical line without its terminator, `None` at end of input
    fn next_line(&mut self) -> Option<io::Result<String>> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                let line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(line) => line.to_string(),
                    Cow::Owned(line) => {
                        warn!(line_number = self.line_number + 1, "invalid UTF-8 replaced");
                        line
                    }
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.next_line() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                None => return self.pending.take().and_then(PendingRecord::finish).map(Ok),
            };

            self.line_number += 1;
            let line = line.replace('\r', "");

            if starts_record(&line) {
                let started = PendingRecord {
                    line_number: self.line_number,
                    lines: vec![line],
                };
                let finished = self.pending.replace(started).and_then(PendingRecord::finish);
                if let Some(record) = finished {
                    return Some(Ok(record));
                }
            } else {
                match self.pending.as_mut() {
                    Some(pending) => pending.lines.push(line),
                    None => {
                        self.pending = Some(PendingRecord {
                            line_number: self.line_number,
                            lines: vec![line],
                        })
                    }
                }
            }
        }
    }
}

/// Reassemble records from in-memory log text
pub fn reassemble(text: &str) -> Vec<LogRecord> {
    // reading from a byte slice cannot fail
    RecordReader::new(text.as_bytes())
        .filter_map(|record| record.ok())
        .collect()
}

// ============================================================================
// RECORD OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProperties,
    InProgress,
    NotReceipt,
}

/// What became of one logical record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Parsed(Receipt),
    Skipped(SkipReason),
    Failed { line_number: usize, error: ParseError },
}

/// Run one record through the receipt parser
pub fn process_record(record: &LogRecord, parser: &ReceiptParser) -> RecordOutcome {
    match parser.parse_record(&record.text) {
        Ok(Extracted::Receipt(receipt)) if receipt.is_receipt => {
            RecordOutcome::Parsed(receipt.with_line_number(record.line_number))
        }
        Ok(Extracted::Receipt(_)) => RecordOutcome::Skipped(SkipReason::NotReceipt),
        Ok(Extracted::NoProperties) => RecordOutcome::Skipped(SkipReason::NoProperties),
        Ok(Extracted::InProgress) => RecordOutcome::Skipped(SkipReason::InProgress),
        Err(error) => RecordOutcome::Failed {
            line_number: record.line_number,
            error,
        },
    }
}

// ============================================================================
// WHOLE-LOG PARSING
// ============================================================================

/// Counters for one conversion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub records: usize,
    pub receipts: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reconciled: usize,
}

impl ParseSummary {
    fn record(&mut self, outcome: &RecordOutcome) {
        self.records += 1;
        match outcome {
            RecordOutcome::Parsed(receipt) => {
                self.receipts += 1;
                if receipt.is_reconciled {
                    self.reconciled += 1;
                }
            }
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    /// Receipts in log order
    pub receipts: Vec<Receipt>,
    pub summary: ParseSummary,
}

/// Parse every record of a log
///
/// A record that fails to parse is logged and dropped; only a read error
/// aborts, and then no receipts are returned at all.
pub fn parse_log<R: BufRead>(reader: R, parser: &ReceiptParser) -> Result<ParsedLog> {
    let mut parsed = ParsedLog::default();

    for record in RecordReader::new(reader) {
        let record = record.context("Failed to read log")?;
        let outcome = process_record(&record, parser);
        parsed.summary.record(&outcome);

        match outcome {
            RecordOutcome::Parsed(receipt) => {
                if !receipt.is_reconciled {
                    debug!(
                        line_number = receipt.line_number,
                        difference = ?difference(&receipt),
                        "receipt not reconciled"
                    );
                }
                parsed.receipts.push(receipt)
            }
            RecordOutcome::Skipped(reason) => {
                debug!(line_number = record.line_number, ?reason, "record skipped")
            }
            RecordOutcome::Failed { line_number, error } => {
                error!(line_number, %error, "error parsing record")
            }
        }
    }

    let summary = parsed.summary;
    info!(
        records = summary.records,
        receipts = summary.receipts,
        skipped = summary.skipped,
        failed = summary.failed,
        reconciled = summary.reconciled,
        "log parsed"
    );

    Ok(parsed)
}

/// Open a log file and parse it
pub fn parse_log_file(path: &Path, parser: &ReceiptParser) -> Result<ParsedLog> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    parse_log(BufReader::new(file), parser)
        .with_context(|| format!("Failed to parse log file: {}", path.display()))
}

// ============================================================================
// TESTS
// ============================================================================
