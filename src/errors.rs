// ❌ Record-level parse errors
// A ParseError abandons one record; file-level failures go through anyhow

use std::num::ParseFloatError;
use thiserror::Error;

/// Error that abandons a single log record.
///
/// The reassembler logs it with the record's line number and carries on
/// with the next record, so a `ParseError` never aborts a whole conversion.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// Key outside both the recognized fields and the ignore list
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// Cents value that is neither empty nor numeric
    #[error("invalid price {value:?}: {source}")]
    InvalidPrice {
        value: String,
        #[source]
        source: ParseFloatError,
    },
}
