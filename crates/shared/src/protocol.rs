use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply fields probed on a JSON response body, in priority order.
const REPLY_FIELDS: [&str; 4] = ["result", "text", "output", "response"];

/// Shown when the endpoint acknowledged the message with an empty body.
pub const REPLY_RECEIVED_FALLBACK: &str = "Message received.";

/// Outbound request body. Field names are the endpoint's wire contract and
/// must not drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub chat_input: String,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub ruc: Option<String>,
    #[serde(rename = "razon_social")]
    pub razon_social: Option<String>,
    pub message_id: String,
    /// Epoch milliseconds at send time.
    pub timestamp: i64,
}

/// Extracts the assistant reply from a successful response body.
///
/// JSON bodies yield the first non-empty known reply field; anything else is
/// taken verbatim, and an empty body degrades to a fixed acknowledgment.
/// This never fails: unparseable bodies are plain text by definition.
pub fn reply_text(raw: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        for field in REPLY_FIELDS {
            match parsed.get(field) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Number(n)) => return n.to_string(),
                Some(Value::Bool(b)) => return b.to_string(),
                _ => {}
            }
        }
    }
    if raw.trim().is_empty() {
        REPLY_RECEIVED_FALLBACK.to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_exact_wire_field_names() {
        let request = ChatRequest {
            session_id: "acme:u1".into(),
            chat_input: "hola".into(),
            user_id: Some("u1".into()),
            tenant_id: Some("acme".into()),
            ruc: Some("20100047218".into()),
            razon_social: Some("ACME SAC".into()),
            message_id: "m-1".into(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert_eq!(
            json,
            r#"{"sessionId":"acme:u1","chatInput":"hola","userId":"u1","tenantId":"acme","ruc":"20100047218","razon_social":"ACME SAC","messageId":"m-1","timestamp":1700000000000}"#
        );
    }

    #[test]
    fn reply_text_probes_fields_in_priority_order() {
        assert_eq!(reply_text(r#"{"result":"a","output":"b"}"#), "a");
        assert_eq!(reply_text(r#"{"text":"t","response":"r"}"#), "t");
        assert_eq!(reply_text(r#"{"output":"hello"}"#), "hello");
        assert_eq!(reply_text(r#"{"response":"last"}"#), "last");
    }

    #[test]
    fn reply_text_skips_empty_and_missing_fields() {
        assert_eq!(reply_text(r#"{"result":"","output":"kept"}"#), "kept");
        // No known field at all: the raw body is the reply.
        let raw = r#"{"unrelated":"x"}"#;
        assert_eq!(reply_text(raw), raw);
    }

    #[test]
    fn reply_text_stringifies_scalar_replies() {
        assert_eq!(reply_text(r#"{"result":42}"#), "42");
        assert_eq!(reply_text(r#"{"output":true}"#), "true");
    }

    #[test]
    fn plain_text_body_is_used_verbatim() {
        assert_eq!(reply_text("plain acknowledgment"), "plain acknowledgment");
    }

    #[test]
    fn empty_body_degrades_to_fixed_acknowledgment() {
        assert_eq!(reply_text(""), REPLY_RECEIVED_FALLBACK);
        assert_eq!(reply_text("   "), REPLY_RECEIVED_FALLBACK);
    }
}
