use std::sync::Arc;

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::errors::AppError;
use crate::models::{HealthResponse, UpstreamReply, DEFAULT_CONTENT_TYPE, DEFAULT_EVENT};

const SIGNATURE_HEADER: &str = "X-Signature";
const HEALTH_MESSAGE: &str = "Use POST para encaminhar ao webhook n8n";

/// Relays browser events to the automation webhook.
///
/// Cheap to clone: the config is shared and `reqwest::Client` is an `Arc`
/// internally, so each request handler gets its own handle.
#[derive(Clone)]
pub struct ProxyService {
    config: Arc<ProxyConfig>,
    client: reqwest::Client,
}

impl ProxyService {
    pub fn new(config: ProxyConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(AppError::ClientBuild)?;
        Ok(Self { config: Arc::new(config), client })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            ok: true,
            message: HEALTH_MESSAGE,
            has_env: self.config.presence(),
            allowed_origin: self.config.allowed_origin.clone(),
        }
    }

    /// Forwards `body` to the webhook and returns its answer verbatim.
    ///
    /// Configuration is checked first; nothing leaves the process unless all
    /// four upstream values are present.
    pub async fn forward(&self, body: &[u8]) -> Result<UpstreamReply, AppError> {
        let creds = self.config.credentials().inspect_err(|e| {
            error!("Refusing to forward: {e}");
        })?;

        let request_id = Uuid::new_v4();
        let payload = normalize_payload(body);
        debug!(%request_id, bytes = payload.len(), "Forwarding event to webhook");

        let response = self
            .client
            .post(&creds.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, creds.basic_auth_header())
            .header(SIGNATURE_HEADER, &creds.shared_secret)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                let err = AppError::from_send(e, self.config.upstream_timeout);
                if err.is_timeout() {
                    warn!(%request_id, "{err}");
                } else {
                    error!(%request_id, "{err}");
                }
                err
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body = response.bytes().await.map_err(|e| {
            let err = AppError::UpstreamBody(e.without_url());
            error!(%request_id, "{err}");
            err
        })?;

        info!(%request_id, status, %content_type, bytes = body.len(), "Webhook answered");

        Ok(UpstreamReply { status, content_type, body })
    }
}

/// Makes sure the forwarded payload is a JSON object carrying an `event` tag.
///
/// Objects that already have `event` are returned byte-for-byte. Objects
/// without it get [`DEFAULT_EVENT`] injected. Anything else (empty, not JSON,
/// JSON but not an object) becomes `{"event": DEFAULT_EVENT}`.
pub fn normalize_payload(body: &[u8]) -> Bytes {
    let mut object = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.contains_key("event") => {
            return Bytes::copy_from_slice(body);
        }
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    object.insert("event".to_string(), Value::String(DEFAULT_EVENT.to_string()));
    Bytes::from(Value::Object(object).to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn as_json(bytes: &Bytes) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn payload_with_event_is_forwarded_byte_for_byte() {
        let raw = br#"{ "sessionId":"s-1",  "event":"conversation_started" }"#;
        assert_eq!(normalize_payload(raw).as_ref(), raw.as_slice());
    }

    #[test]
    fn payload_without_event_gets_default_tag() {
        let raw = br#"{"sessionId":"s-1","message":"oi"}"#;
        assert_eq!(
            as_json(&normalize_payload(raw)),
            json!({"sessionId": "s-1", "message": "oi", "event": "message_sent"})
        );
    }

    #[test]
    fn non_object_bodies_become_bare_event() {
        for raw in [&b""[..], b"not json", b"[1,2,3]", b"\"text\"", b"null"] {
            assert_eq!(
                as_json(&normalize_payload(raw)),
                json!({"event": "message_sent"}),
                "body: {:?}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[test]
    fn health_reports_presence_without_values() {
        let config = ProxyConfig::from_lookup(|key| match key {
            "CHAT_WEBHOOK_URL" => Some("https://hooks.example/abc".to_string()),
            "CHAT_SHARED_SECRET" => Some("top-secret".to_string()),
            _ => None,
        });
        let svc = ProxyService::new(config).unwrap();
        let body = serde_json::to_string(&svc.health()).unwrap();

        assert!(!body.contains("top-secret"));
        assert!(!body.contains("hooks.example"));
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["hasEnv"]["CHAT_WEBHOOK_URL"], json!(true));
        assert_eq!(value["hasEnv"]["CHAT_BASIC_USER"], json!(false));
        assert_eq!(value["allowedOrigin"], json!("*"));
    }
}
