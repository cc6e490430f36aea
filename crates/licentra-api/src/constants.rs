//! Route prefixes and fixed limits.
//!
//! Paths are preserved verbatim for compatibility with existing clients.

pub const ADMIN_API_PREFIX: &str = "/api/v1/admin";
pub const CUSTOMER_API_PREFIX: &str = "/api/v1/customer";
pub const SDK_API_PREFIX: &str = "/sdk/v1";

/// Number of events in the dashboard activity feed.
pub const RECENT_ACTIVITY_LIMIT: i64 = 5;

/// Request bodies are small JSON/form payloads.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
