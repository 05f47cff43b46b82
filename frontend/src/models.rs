use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event tags sent to the relay. The set is open; the relay does not check it.
pub mod events {
    pub const CONVERSATION_STARTED: &str = "conversation_started";
    pub const MESSAGE_SENT: &str = "message_sent";
    pub const CHAT_CLOSED: &str = "chat_closed";
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One entry in the visible transcript.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

impl ChatMessage {
    pub fn new(id: String, role: Role, content: String, timestamp: String) -> Self {
        Self { id, role, content, timestamp, in_reply_to: None }
    }

    pub fn replying_to(mut self, message_id: &str) -> Self {
        self.in_reply_to = Some(message_id.to_string());
        self
    }
}

/// Wire format of every event posted to the relay:
/// `{event, sessionId, timestamp, ...payload}`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event: String,
    pub session_id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl EventEnvelope {
    /// Payload keys that collide with the envelope fields are dropped; the
    /// envelope always wins.
    pub fn new(event: &str, session_id: &str, timestamp: String, mut payload: Map<String, Value>) -> Self {
        for reserved in ["event", "sessionId", "timestamp"] {
            payload.remove(reserved);
        }
        Self {
            event: event.to_string(),
            session_id: session_id.to_string(),
            timestamp,
            payload,
        }
    }
}

/// Lifecycle of one submitted message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    Sending,
    Replied,
    Failed,
}

impl TurnState {
    pub fn is_sending(&self) -> bool {
        matches!(self, TurnState::Sending)
    }

    /// Moves to `Sending`. Returns `false`, leaving the state alone, when a
    /// turn is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_sending() {
            return false;
        }
        *self = TurnState::Sending;
        true
    }

    /// Settles the in-flight turn. A no-op when nothing is in flight.
    pub fn settle(&mut self, replied: bool) {
        if self.is_sending() {
            *self = if replied { TurnState::Replied } else { TurnState::Failed };
        }
    }
}
