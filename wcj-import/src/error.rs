//! Error types for wcj-import
//!
//! Two severities:
//! - [`ImportError`]: run-fatal. The run aborts and the process exits non-zero.
//! - [`RecordError`]: per-record. Logged and counted; the batch continues.
//!
//! An unflagged record with no matching goal is not an error at all: it is
//! routed to the unmatched report. The same split applies to seed list rows.

use std::fmt;
use thiserror::Error;

/// Run-fatal errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// The store cannot be reached (at startup or mid-run)
    #[error("Store connection failed ({resource}): {source}")]
    StoreConnection {
        resource: String,
        #[source]
        source: wcj_common::Error,
    },

    /// The input's outer framing is unreadable (not a JSON array of records)
    #[error("Input format error in {input}: {message}")]
    InputFormat { input: String, message: String },

    /// The input could not be opened or read
    #[error("IO error reading {input}: {source}")]
    Io {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input reader task died unexpectedly
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A single field or record shape that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("missing or empty name field `{key}`")]
    MissingName { key: String },

    #[error("field `{key}` has unsupported type {found}")]
    UnsupportedType { key: String, found: &'static str },

    #[error("record holds a value that cannot be represented: {message}")]
    Unrepresentable { message: String },
}

/// Store operation that failed for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    BeginTransaction,
    Lookup,
    CreateLocation,
    CreateGoal,
    UpdateRatings,
    LinkLocation,
    CreateVisit,
    CreateNote,
    Commit,
    Rollback,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::BeginTransaction => "begin_transaction",
            StoreOperation::Lookup => "lookup",
            StoreOperation::CreateLocation => "create_location",
            StoreOperation::CreateGoal => "create_goal",
            StoreOperation::UpdateRatings => "update_ratings",
            StoreOperation::LinkLocation => "link_location",
            StoreOperation::CreateVisit => "create_visit",
            StoreOperation::CreateNote => "create_note",
            StoreOperation::Commit => "commit",
            StoreOperation::Rollback => "rollback",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-record errors
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("{operation} failed for `{name}`: {source}")]
    Store {
        name: String,
        operation: StoreOperation,
        #[source]
        source: wcj_common::Error,
    },
}

impl RecordError {
    pub fn store(
        name: &str,
        operation: StoreOperation,
        source: impl Into<wcj_common::Error>,
    ) -> Self {
        RecordError::Store {
            name: name.to_string(),
            operation,
            source: source.into(),
        }
    }

    /// Connection-class store failures escalate to a run-fatal error
    pub fn is_connection(&self) -> bool {
        match self {
            RecordError::Store { source, .. } => source.is_connection(),
            RecordError::Decode(_) => false,
        }
    }
}
