use wasm_bindgen::{JsCast, JsValue};

const STORAGE_KEY: &str = "chatSessionId";

/// Returns this tab's session id, creating and storing it on first use.
///
/// Storage failures (private mode, disabled storage) are logged and the
/// freshly generated id is still returned; the caller keeps it for the rest
/// of the page's life.
pub fn load_or_create_session_id() -> String {
    let storage = web_sys::window().and_then(|w| w.session_storage().ok().flatten());

    if let Some(existing) = storage
        .as_ref()
        .and_then(|s| s.get_item(STORAGE_KEY).ok().flatten())
        .filter(|id| !id.is_empty())
    {
        return existing;
    }

    let id = random_uuid().unwrap_or_else(|| {
        fallback_session_id(js_sys::Date::now(), js_sys::Math::random())
    });

    match storage {
        Some(s) => {
            if let Err(e) = s.set_item(STORAGE_KEY, &id) {
                log::warn!("Could not persist chat session id: {e:?}");
            }
        }
        None => log::warn!("sessionStorage unavailable, chat session id lives in memory only"),
    }
    id
}

/// `crypto.randomUUID()` when the browser provides it.
fn random_uuid() -> Option<String> {
    let crypto = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("crypto")).ok()?;
    let func = js_sys::Reflect::get(&crypto, &JsValue::from_str("randomUUID"))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()?;
    func.call0(&crypto).ok()?.as_string()
}

/// `sess-<millis>-<random base36>` for browsers without `randomUUID`.
pub fn fallback_session_id(now_ms: f64, random: f64) -> String {
    let suffix = (random.clamp(0.0, 1.0) * 36f64.powi(8)) as u64;
    format!("sess-{}-{}", now_ms as u64, to_base36(suffix))
}

/// Client-side id for a transcript entry.
pub fn message_id(prefix: &str, now_ms: f64, random: f64) -> String {
    let suffix = (random.clamp(0.0, 1.0) * 36f64.powi(6)) as u64;
    format!("{prefix}-{}-{}", now_ms as u64, to_base36(suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_id_has_timestamp_and_suffix() {
        let id = fallback_session_id(1_700_000_000_123.0, 0.5);
        assert!(id.starts_with("sess-1700000000123-"), "got {id}");
        let suffix = id.rsplit('-').next().unwrap();
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn different_randomness_gives_different_ids() {
        assert_ne!(fallback_session_id(1.0, 0.25), fallback_session_id(1.0, 0.75));
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1295), "zz");
    }

    #[test]
    fn message_ids_carry_prefix() {
        assert!(message_id("user", 42.0, 0.1).starts_with("user-42-"));
    }
}
