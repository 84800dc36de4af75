//! Size limits for inbound events and search requests.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

/// Maximum single event payload size in bytes (64KB).
pub const MAX_EVENT_SIZE_BYTES: usize = 64 * 1024;

/// Maximum message length (chars).
pub const MAX_MESSAGE_LEN: usize = 32 * 1024;

/// Maximum severity label length.
/// Labels are short (INFO, WARN, ERROR, CRITICAL).
pub const MAX_SEVERITY_LEN: usize = 32;

/// Maximum source identifier length.
/// Hostnames and service names, e.g. "web-server-1" or "api-gateway".
pub const MAX_SOURCE_LEN: usize = 256;

/// Upper bound for the optional search `limit`.
pub const MAX_SEARCH_LIMIT: u32 = 10_000;

/// Default severity applied during enrichment.
pub const DEFAULT_SEVERITY: &str = "INFO";

/// Default source applied during enrichment.
pub const DEFAULT_SOURCE: &str = "unknown";
