//! Standardized API responses.

use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use log_core::EnrichedEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Acknowledgement for an accepted log event.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub received_at: i64,
}

impl IngestResponse {
    pub fn accepted() -> Self {
        Self {
            message: "Log received and queued for processing".to_string(),
            received_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Search results, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    pub data: Vec<EnrichedEvent>,
}

impl SearchResponse {
    pub fn success(data: Vec<EnrichedEvent>) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub uptime: String,
}

impl PingResponse {
    pub fn ok(uptime: Duration) -> Self {
        Self {
            status: "ok".to_string(),
            uptime: format!("{}s", uptime.as_secs()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub clickhouse_connected: bool,
    pub pipeline_running: bool,
    pub queue_depth: u64,
    pub in_flight: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error carrying one of the service's error codes.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn unavailable(code: impl Into<String>, msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            response: ErrorResponse::new(msg, code),
            retry_after,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_001", msg)
    }

    pub fn validation(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Validation failed", code).with_details(errors),
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<log_core::Error> for ApiError {
    fn from(err: log_core::Error) -> Self {
        match &err {
            log_core::Error::Validation { code, message, .. } => {
                ApiError::validation(*code, vec![message.clone()])
            }
            log_core::Error::Capacity {
                code,
                message,
                retry_after,
                ..
            } => ApiError::unavailable(*code, message, *retry_after),
            log_core::Error::Database {
                code,
                message,
                http_status,
            } => {
                let status =
                    StatusCode::from_u16(*http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                ApiError::with_code(status, *code, message)
            }
            log_core::Error::Internal(_) => ApiError::internal(err.to_string()),
        }
    }
}
