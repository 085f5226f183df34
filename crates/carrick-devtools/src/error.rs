//! Error types for the carrick-devtools crate, and the classifier that maps
//! raw inspector error payloads onto them.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors surfaced by the DevTools client engine.
///
/// The display strings double as the wire-level diagnostic text handed to
/// the automation layer above, so they are stable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DevToolsError {
    /// The transport is not connected, refused to connect, or dropped.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// A deadline expired before the awaited response or event arrived.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Anything the engine cannot attribute to a more specific class.
    #[error("unknown error: {0}")]
    Unknown(String),

    /// The browser rejected a command parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The browser does not implement the requested method.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The referenced frame (or session) no longer exists.
    #[error("no such frame: {0}")]
    NoSuchFrame(String),

    /// The command was refused because a modal dialog is open in the page.
    #[error("unexpected alert open")]
    UnexpectedAlertOpen,
}

// JSON-RPC error codes the inspector is known to emit.
const CODE_INVALID_PARAMS: i64 = -32602;
const CODE_METHOD_NOT_FOUND: i64 = -32601;
const CODE_SERVER_ERROR: i64 = -32000;
const CODE_SESSION_NOT_FOUND: i64 = -32001;

fn frame_not_found_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)frame.*not found").expect("valid regex"))
}

/// Classify a raw inspector error payload (the serialized `error` object of
/// a command response) into a [`DevToolsError`].
///
/// The classifier is pure: it inspects only the payload. Codes outside the
/// known set fall through to [`DevToolsError::Unknown`] with the original
/// payload embedded verbatim.
pub fn parse_inspector_error(raw_error: &str) -> DevToolsError {
    if raw_error.is_empty() {
        return DevToolsError::Unknown("inspector error with no error message".to_string());
    }

    let parsed: serde_json::Value = match serde_json::from_str(raw_error) {
        Ok(value) => value,
        Err(_) => return DevToolsError::Unknown(format!("unhandled inspector error: {raw_error}")),
    };

    let message = parsed
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("")
        .to_string();

    // The server reports an invalid navigation URL under the generic server
    // error code, so the message is the only discriminator.
    if message.contains("Cannot navigate to invalid URL") {
        return DevToolsError::InvalidArgument(message);
    }

    match parsed.get("code").and_then(|c| c.as_i64()) {
        Some(CODE_INVALID_PARAMS) => DevToolsError::InvalidArgument(message),
        Some(CODE_METHOD_NOT_FOUND) => DevToolsError::UnknownCommand(message),
        Some(CODE_SESSION_NOT_FOUND) => DevToolsError::NoSuchFrame(message),
        Some(CODE_SERVER_ERROR) if frame_not_found_pattern().is_match(&message) => {
            DevToolsError::NoSuchFrame(message)
        }
        _ => DevToolsError::Unknown(format!("unhandled inspector error: {raw_error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error_payload() {
        let err = parse_inspector_error("");
        assert_eq!(
            err.to_string(),
            "unknown error: inspector error with no error message"
        );
    }

    #[test]
    fn test_invalid_url_message_maps_to_invalid_argument() {
        let err = parse_inspector_error(r#"{"message": "Cannot navigate to invalid URL"}"#);
        assert!(matches!(err, DevToolsError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_params_code() {
        let err = parse_inspector_error(r#"{"code": -32602, "message": "Error description"}"#);
        assert_eq!(err.to_string(), "invalid argument: Error description");
    }

    #[test]
    fn test_unrecognized_code_falls_through_with_payload() {
        let raw = r#"{"code": 10, "message": "Error description"}"#;
        let err = parse_inspector_error(raw);
        assert_eq!(
            err.to_string(),
            format!("unknown error: unhandled inspector error: {raw}")
        );
    }

    #[test]
    fn test_method_not_found_code() {
        let err = parse_inspector_error(r#"{"code":-32601,"message":"SOME MESSAGE"}"#);
        assert_eq!(err.to_string(), "unknown command: SOME MESSAGE");
    }

    #[test]
    fn test_server_error_with_frame_message_maps_to_no_such_frame() {
        // The server returns the generic code -32000 here, so the message
        // content carries the meaning.
        let err = parse_inspector_error(
            r#"{"code":-32000,"message":"Frame with the given id was not found."}"#,
        );
        assert_eq!(
            err.to_string(),
            "no such frame: Frame with the given id was not found."
        );
    }

    #[test]
    fn test_session_not_found_code_maps_to_no_such_frame() {
        let err = parse_inspector_error(r#"{"code":-32001,"message":"SOME MESSAGE"}"#);
        assert_eq!(err.to_string(), "no such frame: SOME MESSAGE");
    }

    #[test]
    fn test_server_error_without_frame_message_is_unknown() {
        let raw = r#"{"code":-32000,"message":"Server error"}"#;
        let err = parse_inspector_error(raw);
        assert!(matches!(err, DevToolsError::Unknown(_)));
    }

    #[test]
    fn test_non_json_payload_is_unknown() {
        let err = parse_inspector_error("err");
        assert_eq!(err.to_string(), "unknown error: unhandled inspector error: err");
    }
}
