//! Structured error types for tree operations.

use crate::types::TaskId;
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Errors surfaced to callers of the tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TreeError {
    pub fn task_not_found(task_id: TaskId) -> Self {
        TreeError::TaskNotFound(task_id)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        TreeError::InvalidFieldValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TreeError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            TreeError::InvalidFieldValue { .. } => ErrorCode::InvalidFieldValue,
            TreeError::Database(_) => ErrorCode::DatabaseError,
            TreeError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TreeError::TaskNotFound(_) | TreeError::InvalidFieldValue { .. }
        )
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for TreeError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TreeError>() {
            Ok(tree_err) => tree_err,
            Err(err) => match err.downcast_ref::<rusqlite::Error>() {
                Some(db_err) => TreeError::Database(db_err.to_string()),
                None => TreeError::Internal(err.to_string()),
            },
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = std::result::Result<T, TreeError>;
