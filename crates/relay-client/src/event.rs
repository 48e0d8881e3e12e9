use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::Error;

/// One raw message off the SSE stream, consumed once.
#[derive(Debug, Clone, Default)]
pub struct SseMessage {
    pub event: Option<String>,
    pub data: Option<String>,
}

/// Control-plane signals carried on the channel. None of these ever produce
/// an outbound HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Ready,
    Ping,
    Connected,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Lifecycle(Lifecycle),
    Payload(WebhookPayload),
}

/// A webhook reconstructed from one SSE message. Fully self-contained: no
/// field refers to any prior message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookPayload {
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Classifies a raw SSE message. Lifecycle checks run before JSON parsing so
/// that control messages are never misread as payloads.
pub fn decode(message: &SseMessage) -> Result<DecodedEvent, Error> {
    if message.event.as_deref() == Some("ready") || message.data.as_deref() == Some("ready") {
        return Ok(DecodedEvent::Lifecycle(Lifecycle::Ready));
    }
    if message.event.as_deref() == Some("ping") {
        return Ok(DecodedEvent::Lifecycle(Lifecycle::Ping));
    }

    let data = match message.data.as_deref() {
        Some(data) if !data.trim().is_empty() => data,
        _ => return Ok(DecodedEvent::Lifecycle(Lifecycle::Empty)),
    };

    let mut object: Map<String, Value> = serde_json::from_str(data)?;

    if object.is_empty() {
        return Ok(DecodedEvent::Lifecycle(Lifecycle::Empty));
    }

    match object.get("message").and_then(Value::as_str) {
        Some("connected") => return Ok(DecodedEvent::Lifecycle(Lifecycle::Connected)),
        Some("ready") => return Ok(DecodedEvent::Lifecycle(Lifecycle::Ready)),
        _ => {}
    }

    // bodyB is the legacy base64 wrapping; it wins over a plain body when a
    // sender includes both.
    let body = if let Some(encoded) = object.remove("bodyB") {
        object.remove("body");
        let bytes = BASE64.decode(value_to_string(&encoded))?;
        String::from_utf8_lossy(&bytes).into_owned().into_bytes()
    } else if let Some(body) = object.remove("body") {
        value_to_bytes(&body)
    } else {
        Vec::new()
    };

    let query = match object.remove("query") {
        Some(Value::Object(params)) => params
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect(),
        _ => HashMap::new(),
    };

    let headers = object
        .iter()
        .map(|(k, v)| (k.clone(), value_to_string(v)))
        .collect();

    Ok(DecodedEvent::Payload(WebhookPayload {
        headers,
        query,
        body,
    }))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.clone().into_bytes(),
        Value::Null => Vec::new(),
        other => serde_json::to_vec(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event: Option<&str>, data: Option<&str>) -> SseMessage {
        SseMessage {
            event: event.map(str::to_string),
            data: data.map(str::to_string),
        }
    }

    fn payload(message: &SseMessage) -> WebhookPayload {
        match decode(message).unwrap() {
            DecodedEvent::Payload(payload) => payload,
            other => panic!("expected a payload, got: {other:?}"),
        }
    }

    #[test]
    fn test_ready_by_event_name() {
        let decoded = decode(&message(Some("ready"), Some(r#"{"body":"x"}"#))).unwrap();
        assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Ready));
    }

    #[test]
    fn test_ready_by_data() {
        let decoded = decode(&message(None, Some("ready"))).unwrap();
        assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Ready));
    }

    #[test]
    fn test_ping() {
        let decoded = decode(&message(Some("ping"), Some("anything"))).unwrap();
        assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Ping));
    }

    #[test]
    fn test_empty_variants() {
        for msg in [
            message(None, None),
            message(None, Some("")),
            message(None, Some("   ")),
            message(None, Some("{}")),
        ] {
            let decoded = decode(&msg).unwrap();
            assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Empty));
        }
    }

    #[test]
    fn test_connected_and_ready_messages() {
        let decoded = decode(&message(None, Some(r#"{"message":"connected"}"#))).unwrap();
        assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Connected));

        let decoded = decode(&message(None, Some(r#"{"message":"ready"}"#))).unwrap();
        assert_eq!(decoded, DecodedEvent::Lifecycle(Lifecycle::Ready));
    }

    #[test]
    fn test_malformed_data_is_an_error() {
        assert!(decode(&message(None, Some("{not json"))).is_err());
        assert!(decode(&message(None, Some("[1,2,3]"))).is_err());
    }

    #[test]
    fn test_payload_fields_split() {
        let payload = payload(&message(
            None,
            Some(r#"{"x-foo":"bar","query":{"a":"1"},"body":"hello"}"#),
        ));

        assert_eq!(payload.body, b"hello");
        assert_eq!(payload.query.get("a").map(String::as_str), Some("1"));
        assert_eq!(payload.headers.get("x-foo").map(String::as_str), Some("bar"));
        assert!(!payload.headers.contains_key("body"));
        assert!(!payload.headers.contains_key("query"));
    }

    #[test]
    fn test_legacy_body_b_decodes_base64() {
        // "hi" in base64
        let payload = payload(&message(None, Some(r#"{"bodyB":"aGk="}"#)));

        assert_eq!(payload.body, b"hi");
        assert!(!payload.headers.contains_key("bodyB"));
    }

    #[test]
    fn test_body_b_wins_over_body() {
        let payload = payload(&message(None, Some(r#"{"bodyB":"aGk=","body":"other"}"#)));

        assert_eq!(payload.body, b"hi");
        assert!(!payload.headers.contains_key("body"));
        assert!(!payload.headers.contains_key("bodyB"));
    }

    #[test]
    fn test_invalid_base64_is_an_error() {
        assert!(decode(&message(None, Some(r#"{"bodyB":"!!!"}"#))).is_err());
    }

    #[test]
    fn test_non_string_values_coerced() {
        let payload = payload(&message(
            None,
            Some(r#"{"x-count":42,"query":{"page":2},"body":{"k":"v"}}"#),
        ));

        assert_eq!(payload.headers.get("x-count").map(String::as_str), Some("42"));
        assert_eq!(payload.query.get("page").map(String::as_str), Some("2"));
        assert_eq!(payload.body, br#"{"k":"v"}"#);
    }

    #[test]
    fn test_missing_body_is_empty() {
        let payload = payload(&message(None, Some(r#"{"x-foo":"bar"}"#)));
        assert!(payload.body.is_empty());
    }
}
