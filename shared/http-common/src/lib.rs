//! Shared HTTP utilities for the club registry workspace.
//!
//! Provides framework-agnostic error bodies and the date parsing/formatting
//! used by the api-server's JSON payloads.

use chrono::{DateTime, NaiveDate, Utc};

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "precondition_failed" => "Precondition failed",
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Create a structured error JSON with a custom message.
///
/// Returns: `{"error": {"code": "<code>", "message": "<message>"}}`
pub fn json_error_with_message(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// Date Utilities
// ============================================================================

/// Parse a calendar date from a JSON payload.
///
/// Accepts a plain ISO date (`2001-09-30`) or a full RFC3339 timestamp, in
/// which case the date part is taken in UTC.
pub fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    let trimmed = s.trim();
    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(d) => Ok(d),
        Err(_) => {
            let dt = DateTime::parse_from_rfc3339(trimmed)?;
            Ok(dt.with_timezone(&Utc).date_naive())
        }
    }
}

/// Format a calendar date as ISO `YYYY-MM-DD`.
pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
