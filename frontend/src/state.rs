use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::{json, Map, Value};

use crate::api::{self, SendOptions, SendOutcome};
use crate::models::{events, ChatMessage, Role, TurnState};
use crate::session::{load_or_create_session_id, message_id};

/// How many previous transcript entries travel with each message.
const HISTORY_LIMIT: usize = 20;

pub const APOLOGY_TEXT: &str =
    "Desculpe, tivemos um problema para falar com o assistente. Tente novamente em instantes.";
pub const TIMEOUT_TEXT: &str =
    "A resposta está demorando mais do que o esperado. Tente novamente em instantes.";

/// The chat widget's session controller, provided via Leptos context.
///
/// One instance per page load; every handler reaches it through
/// `expect_context` instead of module-level globals. All fields are arena
/// handles, so the struct is `Copy`.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals (for components to subscribe to) ---
    pub messages: ReadSignal<Vec<ChatMessage>>,
    pub turn: ReadSignal<TurnState>,
    pub is_open: ReadSignal<bool>,

    // --- Write signals (for mutating state) ---
    pub set_messages: WriteSignal<Vec<ChatMessage>>,
    pub set_turn: WriteSignal<TurnState>,
    pub set_is_open: WriteSignal<bool>,

    /// Filled on first send, then reused for every event of the page session.
    session_id: StoredValue<Option<String>>,
    started: StoredValue<bool>,
    pub input_ref: NodeRef<html::Textarea>,
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (messages, set_messages) = signal(Vec::<ChatMessage>::new());
        let (turn, set_turn) = signal(TurnState::default());
        let (is_open, set_is_open) = signal(false);

        let state = Self {
            messages,
            turn,
            is_open,
            set_messages,
            set_turn,
            set_is_open,
            session_id: StoredValue::new(None),
            started: StoredValue::new(false),
            input_ref: NodeRef::new(),
        };

        provide_context(state);
        state
    }

    pub fn is_sending(&self) -> bool {
        self.turn.get().is_sending()
    }

    fn session_id(&self) -> String {
        if let Some(id) = self.session_id.get_value() {
            return id;
        }
        let id = load_or_create_session_id();
        self.session_id.set_value(Some(id.clone()));
        id
    }

    pub fn focus_input(&self) {
        if let Some(input) = self.input_ref.get_untracked() {
            let _ = input.focus();
        }
    }

    /// Opens or closes the widget. The first open announces the conversation.
    pub fn toggle_open(&self) {
        let opening = !self.is_open.get_untracked();
        self.set_is_open.set(opening);

        if opening && !self.started.get_value() {
            self.started.set_value(true);
            self.notify(events::CONVERSATION_STARTED, Map::new());
        } else if !opening {
            let payload = json!({ "messageCount": self.messages.with_untracked(Vec::len) });
            self.notify(events::CHAT_CLOSED, into_map(payload));
        }
    }

    /// Fire-and-forget status event. Failures are logged by `send_event`.
    fn notify(&self, event: &'static str, payload: Map<String, Value>) {
        let session_id = self.session_id();
        spawn_local(async move {
            if let Ok(SendOutcome::Delivered(false)) =
                api::send_event(&session_id, event, payload, SendOptions::notify()).await
            {
                log::debug!("Status event '{event}' was not delivered");
            }
        });
    }

    /// Sends a user message and appends the assistant's answer.
    ///
    /// While a turn is in flight further calls only refocus the input and
    /// return `false`.
    pub fn send_message(&self, text: String) -> bool {
        let Some(guard) = self.begin_turn() else {
            return false;
        };

        let history = self.messages.with_untracked(|msgs| history_payload(msgs, HISTORY_LIMIT));
        let user_msg = ChatMessage::new(
            message_id("user", js_sys::Date::now(), js_sys::Math::random()),
            Role::User,
            text.clone(),
            api::now_iso(),
        );
        let user_msg_id = user_msg.id.clone();
        self.set_messages.update(|msgs| msgs.push(user_msg));

        let payload = into_map(json!({
            "message": text,
            "messageId": user_msg_id,
            "history": history,
        }));
        let session_id = self.session_id();
        let state = *self;

        spawn_local(async move {
            let mut guard = guard;
            let result =
                api::send_event(&session_id, events::MESSAGE_SENT, payload, SendOptions::reply())
                    .await;

            let (role, content) = match result {
                Ok(SendOutcome::Reply(Some(body))) => {
                    guard.replied = true;
                    (Role::Assistant, body.display_text())
                }
                Ok(_) => (Role::System, APOLOGY_TEXT.to_string()),
                Err(e) if e.is_timeout() => {
                    log::warn!("Chat reply timed out: {e}");
                    (Role::System, TIMEOUT_TEXT.to_string())
                }
                Err(e) => {
                    log::error!("Chat request failed: {e}");
                    (Role::System, APOLOGY_TEXT.to_string())
                }
            };

            let reply = ChatMessage::new(
                message_id(role.as_str(), js_sys::Date::now(), js_sys::Math::random()),
                role,
                content,
                api::now_iso(),
            )
            .replying_to(&user_msg_id);
            state.set_messages.update(|msgs| msgs.push(reply));

            drop(guard);
            state.focus_input();
        });
        true
    }

    /// Claims the single in-flight slot. When a turn is already running the
    /// input is refocused and nothing else happens.
    fn begin_turn(&self) -> Option<TurnGuard> {
        let mut began = false;
        self.set_turn.update(|turn| began = turn.begin());
        if !began {
            self.focus_input();
            return None;
        }
        Some(TurnGuard::new(self.set_turn))
    }
}

/// Settles the in-flight turn when dropped, which re-enables the input and
/// removes the typing indicator on every exit path.
struct TurnGuard {
    set_turn: WriteSignal<TurnState>,
    replied: bool,
}

impl TurnGuard {
    fn new(set_turn: WriteSignal<TurnState>) -> Self {
        Self { set_turn, replied: false }
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let replied = self.replied;
        self.set_turn.update(|turn| turn.settle(replied));
    }
}

/// `[{role, content}, ...]` for the last `limit` transcript entries,
/// oldest first.
pub fn history_payload(messages: &[ChatMessage], limit: usize) -> Value {
    let start = messages.len().saturating_sub(limit);
    Value::Array(
        messages[start..]
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect(),
    )
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
