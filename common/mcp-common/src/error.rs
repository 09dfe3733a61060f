//! Error helpers for MCP tool handlers
//!
//! Protocol-level errors are reserved for calls the server cannot interpret.
//! Failures a tool can explain to the user belong in
//! [`text_error`](crate::text_error) results instead.

use rmcp::ErrorData as McpError;

/// Create an invalid params error with a message
///
/// Use this when the tool receives invalid parameters.
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}
