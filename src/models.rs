use axum::body::Bytes;
use serde::Serialize;

/// Event tag injected when a forwarded JSON object has no `event` field.
pub const DEFAULT_EVENT: &str = "message_sent";

/// Content type reported to the browser when the upstream omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Methods served on `/api/chat`, in the order advertised by `Allow`.
pub const ALLOWED_METHODS: &str = "POST, OPTIONS, GET";

/// Which required configuration values are present. Values are never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvPresence {
    #[serde(rename = "CHAT_WEBHOOK_URL")]
    pub webhook_url: bool,
    #[serde(rename = "CHAT_BASIC_USER")]
    pub basic_user: bool,
    #[serde(rename = "CHAT_BASIC_PASS")]
    pub basic_pass: bool,
    #[serde(rename = "CHAT_SHARED_SECRET")]
    pub shared_secret: bool,
}

/// Body of `GET /api/chat`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub message: &'static str,
    pub has_env: EnvPresence,
    pub allowed_origin: String,
}

/// Generic JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<&'static str>>,
}

impl ErrorBody {
    pub fn new(error: &'static str) -> Self {
        Self { error, missing: None }
    }
}

/// What came back from the webhook, relayed to the browser untouched.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}
