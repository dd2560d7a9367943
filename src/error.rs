//! Structured error types for board operations.

use crate::values::ValueError;
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Id does not resolve, or resolves outside the actor's tenant.
    NotFound,
    /// Bad input shape, unknown option id, or a blank required name.
    Validation,
    /// The actor may not mutate this board.
    Authorization,
    /// Version token mismatch on a field write.
    Conflict,

    DatabaseError,
    InternalError,
}

/// Structured error returned by every board entry point.
#[derive(Debug, Serialize)]
pub struct BoardError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl BoardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(kind: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found: {}", kind, id))
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, reason).with_field(field)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::Validation, format!("{} is required", field)).with_field(field)
    }

    pub fn unauthorized(actor_id: &str, board_id: &str) -> Self {
        Self::new(
            ErrorCode::Authorization,
            format!("Actor {} may not edit board {}", actor_id, board_id),
        )
    }

    pub fn version_conflict(task_id: &str, column_id: &str, expected: i64, actual: i64) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!(
                "Value of column {} on task {} changed (expected version {}, found {})",
                column_id, task_id, expected, actual
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BoardError {}

impl From<ValueError> for BoardError {
    fn from(err: ValueError) -> Self {
        BoardError::invalid_value("value", err.to_string())
    }
}

// Storage functions return anyhow; typed errors raised there survive the trip.
impl From<anyhow::Error> for BoardError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BoardError>() {
            Ok(board_err) => board_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => BoardError::database(sql_err),
                Err(err) => BoardError::internal(err),
            },
        }
    }
}

/// Result type for board operations.
pub type BoardResult<T> = std::result::Result<T, BoardError>;
