use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the lead store, scoring engine, and backup manager.
///
/// Row-level problems during a load are not errors: they are collected as
/// [`RowIssue`]s next to a partial result. Only store-wide conditions (a
/// missing required column, a file with no usable rows, a filesystem
/// failure) surface here, and none of them leave the on-disk file in a
/// half-written state.
#[derive(Debug, Error)]
pub enum LeadError {
    /// The input is missing one or more required columns. Fatal to the load.
    #[error("input is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Every row of the input was rejected; there is nothing to load.
    #[error("no usable rows in {} ({failed} rows rejected)", path.display())]
    EmptyLoad { path: PathBuf, failed: usize },

    /// A single record failed write-time validation. Rejects that write only.
    #[error("invalid record: {reason}")]
    Validation { reason: String },

    /// The requested snapshot id does not exist in the backup directory.
    #[error("snapshot {id} not found")]
    SnapshotNotFound { id: String },

    /// The snapshot file exists but no longer round-trips cleanly.
    #[error("snapshot {id} is corrupt: {reason}")]
    SnapshotCorrupt { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl LeadError {
    pub fn validation(reason: impl Into<String>) -> Self {
        LeadError::Validation {
            reason: reason.into(),
        }
    }
}

/// A non-fatal, row-scoped problem collected during a tabular load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based data row number (the header row is not counted).
    pub row: usize,
    pub message: String,
}

impl RowIssue {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}
