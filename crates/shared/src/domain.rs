use serde::{Deserialize, Serialize};

/// Opaque partition key scoping one conversation's log and launcher position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// One conversation entry. Immutable once appended; ordering is insertion
/// order and the log is append-only apart from a full clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    /// Epoch milliseconds. Absent for entries written by older widget builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: Option<i64>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp,
        }
    }
}

/// Top-left of the draggable launcher, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle for the draggable element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn origin(&self) -> Position {
        Position::new(self.left, self.top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_snake_case_sender() {
        let msg = Message::new(Sender::Assistant, "hola", Some(1_700_000_000_000));
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["sender"], "assistant");
        assert_eq!(json["text"], "hola");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn message_timestamp_is_optional_on_the_wire() {
        let msg: Message =
            serde_json::from_str(r#"{"sender":"system","text":"hi"}"#).expect("deserialize");
        assert_eq!(msg.sender, Sender::System);
        assert_eq!(msg.timestamp, None);

        let json = serde_json::to_string(&msg).expect("serialize");
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn rect_edges_derive_from_origin_and_size() {
        let rect = Rect::new(10.0, 20.0, 60.0, 40.0);
        assert_eq!(rect.right(), 70.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.origin(), Position::new(10.0, 20.0));
    }
}
