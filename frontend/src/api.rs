use std::cell::Cell;
use std::rc::Rc;

use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use serde_json::{Map, Value};
use thiserror::Error;
use web_sys::AbortController;

use crate::models::EventEnvelope;
use crate::reply::ReplyBody;

/// Base URL of the relay. Empty means same origin; set `CHAT_API_BASE` at
/// build time when the page is hosted elsewhere.
const API_BASE: &str = match option_env!("CHAT_API_BASE") {
    Some(base) => base,
    None => "",
};

pub const REPLY_TIMEOUT_MS: u32 = 20_000;
pub const NOTIFY_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u32),

    #[error("Server error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendOptions {
    /// Read and return the response body.
    pub expect_response: bool,
    pub timeout_ms: u32,
    /// Return errors to the caller instead of logging them and returning a sentinel.
    pub throw_on_error: bool,
}

impl SendOptions {
    /// Fire-and-forget status events.
    pub fn notify() -> Self {
        Self { expect_response: false, timeout_ms: NOTIFY_TIMEOUT_MS, throw_on_error: false }
    }

    /// Chat turns: the reply is needed and failures are handled by the caller.
    pub fn reply() -> Self {
        Self { expect_response: true, timeout_ms: REPLY_TIMEOUT_MS, throw_on_error: true }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SendOutcome {
    /// `expect_response == false`: whether the relay answered 2xx.
    Delivered(bool),
    /// `expect_response == true`: the parsed body, `None` on a swallowed failure.
    Reply(Option<ReplyBody>),
}

/// Posts one event envelope to the relay with a bounded timeout.
pub async fn send_event(
    session_id: &str,
    event: &str,
    payload: Map<String, Value>,
    opts: SendOptions,
) -> Result<SendOutcome, ApiError> {
    let envelope = EventEnvelope::new(event, session_id, now_iso(), payload);

    match post_envelope(&envelope, opts).await {
        Ok(body) if opts.expect_response => Ok(SendOutcome::Reply(body)),
        Ok(_) => Ok(SendOutcome::Delivered(true)),
        Err(e) if opts.throw_on_error => Err(e),
        Err(e) => {
            if e.is_timeout() {
                log::warn!("Event '{event}' timed out: {e}");
            } else {
                log::error!("Event '{event}' failed: {e}");
            }
            Ok(sentinel(opts))
        }
    }
}

fn sentinel(opts: SendOptions) -> SendOutcome {
    if opts.expect_response {
        SendOutcome::Reply(None)
    } else {
        SendOutcome::Delivered(false)
    }
}

async fn post_envelope(
    envelope: &EventEnvelope,
    opts: SendOptions,
) -> Result<Option<ReplyBody>, ApiError> {
    let controller =
        AbortController::new().map_err(|e| ApiError::Network(format!("{e:?}")))?;
    let timed_out = Rc::new(Cell::new(false));

    // Dropping the timer at the end of this function cancels it.
    let _timer = {
        let controller = controller.clone();
        let timed_out = timed_out.clone();
        Timeout::new(opts.timeout_ms, move || {
            timed_out.set(true);
            controller.abort();
        })
    };
    let classify = |e: gloo_net::Error| {
        if timed_out.get() {
            ApiError::Timeout(opts.timeout_ms)
        } else {
            ApiError::Network(e.to_string())
        }
    };

    let signal = controller.signal();
    let resp = Request::post(&format!("{API_BASE}/api/chat"))
        .abort_signal(Some(&signal))
        .json(envelope)
        .map_err(|e| ApiError::Serialize(e.to_string()))?
        .send()
        .await
        .map_err(classify)?;

    if !resp.ok() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status { status, body });
    }

    if !opts.expect_response {
        return Ok(None);
    }

    let raw = resp.text().await.map_err(classify)?;
    Ok(Some(ReplyBody::parse(raw)))
}

pub fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_is_lenient_and_reply_is_strict() {
        let notify = SendOptions::notify();
        assert!(!notify.expect_response);
        assert!(!notify.throw_on_error);

        let reply = SendOptions::reply();
        assert!(reply.expect_response);
        assert!(reply.throw_on_error);
        assert!(reply.timeout_ms > notify.timeout_ms);
    }

    #[test]
    fn sentinel_matches_the_requested_shape() {
        assert_eq!(sentinel(SendOptions::notify()), SendOutcome::Delivered(false));
        assert_eq!(sentinel(SendOptions::reply()), SendOutcome::Reply(None));
    }

    #[test]
    fn status_error_keeps_code_and_body() {
        let err = ApiError::Status { status: 502, body: "bad gateway".into() };
        assert_eq!(err.to_string(), "Server error 502: bad gateway");
        assert!(!err.is_timeout());
        assert!(ApiError::Timeout(10).is_timeout());
    }
}
