use serde_json::Value;

/// Keys tried at each object level, most preferred first.
const CANDIDATE_KEYS: [&str; 6] = ["output", "reply", "message", "text", "content", "response"];

/// Shown when nothing readable comes back.
pub const FALLBACK_REPLY: &str = "Desculpe, não consegui obter uma resposta agora.";

/// Body returned by the relay: JSON when it parses, raw text otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyBody {
    Json(Value),
    Text(String),
}

impl ReplyBody {
    pub fn parse(raw: String) -> Self {
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => ReplyBody::Json(value),
            Err(_) => ReplyBody::Text(raw),
        }
    }

    /// Text to show in the transcript, or [`FALLBACK_REPLY`].
    ///
    /// Plain-text bodies are treated as unreadable: the webhook answers in
    /// JSON when it has something to say.
    pub fn display_text(&self) -> String {
        match self {
            ReplyBody::Json(value) => extract_assistant_text(value),
            ReplyBody::Text(_) => None,
        }
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// Finds the assistant's text in an arbitrarily shaped webhook response.
///
/// At each object level the candidate keys are matched case-insensitively, in
/// priority order, against non-empty string values. If none matches, nested
/// objects and arrays are searched depth-first in document order.
pub fn extract_assistant_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(extract_assistant_text),
        Value::Object(map) => CANDIDATE_KEYS
            .iter()
            .find_map(|candidate| {
                map.iter()
                    .filter(|(key, _)| key.eq_ignore_ascii_case(candidate))
                    .find_map(|(_, v)| v.as_str().and_then(non_empty))
            })
            .or_else(|| {
                map.values()
                    .filter(|v| v.is_object() || v.is_array())
                    .find_map(extract_assistant_text)
            }),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn top_level_key_wins() {
        assert_eq!(extract_assistant_text(&json!({"output": "Hello"})).as_deref(), Some("Hello"));
    }

    #[test]
    fn nested_object_is_searched() {
        assert_eq!(
            extract_assistant_text(&json!({"data": {"message": "Hi"}})).as_deref(),
            Some("Hi")
        );
    }

    #[test]
    fn key_priority_beats_document_order() {
        let body = json!({"text": "second choice", "reply": "first choice"});
        assert_eq!(extract_assistant_text(&body).as_deref(), Some("first choice"));
    }

    #[test]
    fn keys_match_case_insensitively() {
        assert_eq!(extract_assistant_text(&json!({"Output": "Oi"})).as_deref(), Some("Oi"));
    }

    #[test]
    fn arrays_are_searched_in_order() {
        let body = json!([{"status": "ok"}, {"output": "from n8n"}, {"output": "later"}]);
        assert_eq!(extract_assistant_text(&body).as_deref(), Some("from n8n"));
    }

    #[test]
    fn empty_candidate_falls_through_to_nested_values() {
        let body = json!({"message": "  ", "data": [{"content": "deep"}]});
        assert_eq!(extract_assistant_text(&body).as_deref(), Some("deep"));
    }

    #[test]
    fn unreadable_bodies_use_the_fallback() {
        assert_eq!(ReplyBody::parse("{}".into()).display_text(), FALLBACK_REPLY);
        assert_eq!(ReplyBody::parse("<html>oops</html>".into()).display_text(), FALLBACK_REPLY);
        assert_eq!(ReplyBody::parse("".into()).display_text(), FALLBACK_REPLY);
        assert_eq!(ReplyBody::parse(r#"{"count": 3}"#.into()).display_text(), FALLBACK_REPLY);
    }

    #[test]
    fn parse_keeps_json_and_text_apart() {
        assert_eq!(ReplyBody::parse(r#"{"a":1}"#.into()), ReplyBody::Json(json!({"a": 1})));
        assert_eq!(ReplyBody::parse("plain".into()), ReplyBody::Text("plain".into()));
        assert_eq!(ReplyBody::parse(r#"{"reply":"ok"}"#.into()).display_text(), "ok");
    }
}
