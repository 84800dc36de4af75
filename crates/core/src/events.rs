//! Log event types: what callers submit and what gets stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::MAX_EVENT_SIZE_BYTES;

/// A log event as submitted by a caller, before enrichment.
///
/// Empty `severity` / `source` strings are treated the same as absent ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawEvent {
    /// Free-form log line
    #[validate(length(min = 1, max = 32768))]
    pub message: String,
    /// Severity label (e.g. INFO, WARN, ERROR)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub severity: Option<String>,
    /// Emitting system (e.g. "web-server-1", "api-gateway")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256))]
    pub source: Option<String>,
    /// Original event time, if the caller knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Parses and validates a JSON request body.
    ///
    /// Size is checked before deserialization so oversized bodies are never
    /// allocated into a `RawEvent`.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() > MAX_EVENT_SIZE_BYTES {
            return Err(Error::validation(
                ValidationErrorCode::EventTooLarge,
                format!(
                    "event {}KB exceeds {}KB limit",
                    body.len() / 1024,
                    MAX_EVENT_SIZE_BYTES / 1024
                ),
            ));
        }

        let event: RawEvent = serde_json::from_slice(body).map_err(|e| {
            Error::validation(
                ValidationErrorCode::InvalidFormat,
                format!("invalid log format: {}", e),
            )
        })?;

        event.check()?;
        Ok(event)
    }

    /// Runs field validation.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::validation(ValidationErrorCode::InvalidEvent, e.to_string()))
    }

    /// Severity, if present and non-empty.
    pub fn severity(&self) -> Option<&str> {
        self.severity.as_deref().filter(|s| !s.is_empty())
    }

    /// Source, if present and non-empty.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }
}

/// A log event after identifier assignment and default-filling.
///
/// `processed_at >= timestamp` does not hold in general: caller-supplied
/// timestamps may lie anywhere in the past or future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub id: String,
    pub message: String,
    pub severity: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}
