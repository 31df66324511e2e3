use std::path::PathBuf;

use thiserror::Error;

/// Failures which abort the processing of a statement
///
/// No output file is written once one of these is raised.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("Input document not found: {0}")]
    InputNotFound(String),
    #[error("Could not extract the content of {path:?}: {reason}")]
    UnreadableDocument { path: PathBuf, reason: String },
    #[error("No transactions found in {path:?}")]
    NoTransactionsFound { path: PathBuf },
    #[error("The totals of '{key}' are too large to be computed")]
    AmountOverflow { key: String },
}

/// Reasons for which a candidate row is not turned into a transaction
///
/// A rejected row is dropped and processing continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row '{0}' does not start with a date")]
    NoLeadingDate(String),
    #[error("'{0}' is not a valid MMDDYY date")]
    InvalidDate(String),
    #[error("row '{0}' has no amount")]
    NoAmount(String),
    #[error("row '{0}' has both a withdrawal and a deposit")]
    ConflictingAmounts(String),
    #[error("continuation row '{0}' does not follow a transaction")]
    OrphanContinuation(String),
}
