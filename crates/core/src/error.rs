//! Unified error types for the log processor.
//!
//! Error codes:
//! - VALID_001-004: Validation errors
//! - QUEUE_001: Intake capacity errors
//! - DB_001-002: Persistence and query errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Invalid JSON / Invalid format
    InvalidFormat,
    /// VALID_002: Event failed field validation
    InvalidEvent,
    /// VALID_003: Event exceeds size limit
    EventTooLarge,
    /// VALID_004: Search filter is invalid
    InvalidFilter,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::InvalidEvent => "VALID_002",
            Self::EventTooLarge => "VALID_003",
            Self::InvalidFilter => "VALID_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Capacity error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityErrorCode {
    /// QUEUE_001: Intake queue is full
    IntakeFull,
}

impl CapacityErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::IntakeFull => "QUEUE_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        503
    }
}

/// Database error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Failed to store an event
    StoreFailed,
    /// DB_002: Failed to query events
    QueryFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "DB_001",
            Self::QueryFailed => "DB_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Unified error type for the log processor.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Intake queue could not accept the event.
    #[error("[{code}] {message}")]
    Capacity {
        code: &'static str,
        message: String,
        http_status: u16,
        retry_after: Option<u64>,
    },

    /// Database error with code.
    #[error("[{code}] {message}")]
    Database {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a filter validation error (VALID_004).
    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::validation(ValidationErrorCode::InvalidFilter, msg)
    }

    /// Create a capacity error.
    pub fn capacity(code: CapacityErrorCode, msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::Capacity {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
            retry_after,
        }
    }

    /// Create a database error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Shorthand for a failed write (DB_001).
    pub fn store_failed(msg: impl Into<String>) -> Self {
        Self::database(DbErrorCode::StoreFailed, msg)
    }

    /// Shorthand for a failed read (DB_002).
    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::database(DbErrorCode::QueryFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { http_status, .. } => *http_status,
            Self::Capacity { http_status, .. } => *http_status,
            Self::Database { http_status, .. } => *http_status,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation { code, .. } => Some(code),
            Self::Capacity { code, .. } => Some(code),
            Self::Database { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }
}
