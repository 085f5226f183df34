//! Wire envelope parsing and serialization.
//!
//! One inbound JSON text decodes to exactly one of:
//!
//! - an **event**: has a `method` field and no `id` field;
//! - a **command response**: has an `id` field (`id` wins when both are
//!   present).
//!
//! A response carries either an `error` object or a `result` value. When
//! both are absent the result is inferred as the empty mapping -- the
//! inspector does not return a `result` for every valid response.

use serde::Serialize;
use serde_json::Value;

use crate::error::DevToolsError;

/// One outbound command envelope.
#[derive(Debug, Serialize)]
pub struct CommandEnvelope<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// An unsolicited event pushed by the browser.
#[derive(Debug, Clone)]
pub struct InspectorEvent {
    /// The event method name (e.g. "Page.loadEventFired").
    pub method: String,
    /// The event parameters; an empty mapping when the frame omits them.
    pub params: Value,
    /// Session routing key; empty when the frame omits it.
    pub session_id: String,
}

/// Outcome half of a command response.
#[derive(Debug, Clone)]
pub enum ResponseOutcome {
    /// The raw `error` object, re-serialized, for the error classifier.
    Error(String),
    /// The `result` value (an empty mapping when the frame omits it).
    Result(Value),
}

/// A response correlated to an outbound command by id.
#[derive(Debug, Clone)]
pub struct InspectorCommandResponse {
    pub id: u64,
    pub session_id: String,
    pub outcome: ResponseOutcome,
}

/// A parsed inbound frame.
#[derive(Debug, Clone)]
pub enum InspectorMessage {
    Event(InspectorEvent),
    CommandResponse(InspectorCommandResponse),
}

/// Parse one inbound frame.
///
/// `awaited_id` is the command the caller is currently waiting on, used for
/// diagnostics only. Fails when the text is not JSON, not an object, or has
/// neither a `method` nor an `id` field.
pub fn parse_inspector_message(
    text: &str,
    awaited_id: Option<u64>,
) -> Result<InspectorMessage, DevToolsError> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        tracing::debug!(awaited_id = ?awaited_id, error = %e, "inbound frame is not JSON");
        DevToolsError::Unknown(format!("bad inspector message: {text}"))
    })?;

    let Some(object) = value.as_object() else {
        return Err(DevToolsError::Unknown(format!(
            "bad inspector message: {text}"
        )));
    };

    let session_id = object
        .get("sessionId")
        .and_then(|s| s.as_str())
        .unwrap_or("")
        .to_string();

    if let Some(id) = object.get("id").and_then(|i| i.as_u64()) {
        let outcome = match object.get("error") {
            Some(error) => ResponseOutcome::Error(error.to_string()),
            None => ResponseOutcome::Result(
                object
                    .get("result")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            ),
        };
        return Ok(InspectorMessage::CommandResponse(
            InspectorCommandResponse {
                id,
                session_id,
                outcome,
            },
        ));
    }

    if let Some(method) = object.get("method").and_then(|m| m.as_str()) {
        let params = object
            .get("params")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        return Ok(InspectorMessage::Event(InspectorEvent {
            method: method.to_string(),
            params,
            session_id,
        }));
    }

    Err(DevToolsError::Unknown(format!(
        "bad inspector message: {text}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_json_input_fails() {
        assert!(parse_inspector_message("hi", None).is_err());
    }

    #[test]
    fn test_neither_command_nor_event_fails() {
        assert!(parse_inspector_message("{}", None).is_err());
    }

    #[test]
    fn test_non_object_input_fails() {
        assert!(parse_inspector_message("[1, 2]", None).is_err());
    }

    #[test]
    fn test_event_without_params_gets_empty_mapping() {
        let msg = parse_inspector_message(r#"{"method":"method"}"#, None).unwrap();
        match msg {
            InspectorMessage::Event(event) => {
                assert_eq!(event.method, "method");
                assert_eq!(event.params, json!({}));
                assert!(event.session_id.is_empty());
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_event_without_params_keeps_session_id() {
        let msg =
            parse_inspector_message(r#"{"method":"method","sessionId":"B221AF2"}"#, None).unwrap();
        match msg {
            InspectorMessage::Event(event) => {
                assert_eq!(event.method, "method");
                assert_eq!(event.session_id, "B221AF2");
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_event_with_params() {
        let msg = parse_inspector_message(
            r#"{"method":"method","params":{"key":100},"sessionId":"AB3A"}"#,
            None,
        )
        .unwrap();
        match msg {
            InspectorMessage::Event(event) => {
                assert_eq!(event.params["key"], 100);
                assert_eq!(event.session_id, "AB3A");
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_response_without_error_or_result_infers_empty_result() {
        // The inspector does not necessarily return a "result" dictionary
        // for every valid response; a blank one is inferred.
        let msg = parse_inspector_message(r#"{"id":1,"sessionId":"AB2AF3C"}"#, Some(1)).unwrap();
        match msg {
            InspectorMessage::CommandResponse(response) => {
                assert_eq!(response.id, 1);
                assert_eq!(response.session_id, "AB2AF3C");
                match response.outcome {
                    ResponseOutcome::Result(result) => assert_eq!(result, json!({})),
                    other => panic!("expected result outcome, got {other:?}"),
                }
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_response_with_error() {
        let msg = parse_inspector_message(r#"{"id":1,"error":{}}"#, Some(1)).unwrap();
        match msg {
            InspectorMessage::CommandResponse(response) => {
                assert_eq!(response.id, 1);
                match response.outcome {
                    ResponseOutcome::Error(raw) => assert!(!raw.is_empty()),
                    other => panic!("expected error outcome, got {other:?}"),
                }
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_response_with_result() {
        let msg = parse_inspector_message(r#"{"id":1,"result":{"key":1}}"#, Some(1)).unwrap();
        match msg {
            InspectorMessage::CommandResponse(response) => {
                assert_eq!(response.id, 1);
                match response.outcome {
                    ResponseOutcome::Result(result) => assert_eq!(result["key"], 1),
                    other => panic!("expected result outcome, got {other:?}"),
                }
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn test_id_wins_over_method() {
        // A frame with both fields is a command response.
        let msg =
            parse_inspector_message(r#"{"id":1,"method":"method","result":{}}"#, None).unwrap();
        assert!(matches!(msg, InspectorMessage::CommandResponse(_)));
    }

    #[test]
    fn test_command_envelope_serialization() {
        let params = json!({"param": 1});
        let envelope = CommandEnvelope {
            id: 7,
            method: "Runtime.evaluate",
            params: &params,
            session_id: None,
        };
        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(encoded["id"], 7);
        assert_eq!(encoded["method"], "Runtime.evaluate");
        assert_eq!(encoded["params"]["param"], 1);
        assert!(encoded.get("sessionId").is_none());
    }

    #[test]
    fn test_command_envelope_with_session_id() {
        let params = json!({});
        let envelope = CommandEnvelope {
            id: 1,
            method: "method",
            params: &params,
            session_id: Some("AB3A"),
        };
        let encoded = serde_json::to_value(&envelope).unwrap();
        assert_eq!(encoded["sessionId"], "AB3A");
    }
}
