use thiserror::Error;

/// Every way a relay request can fail.
///
/// Display strings end up in logs only; callers receive the fixed bodies built
/// in `routes::api_routes::error_response`, so no variant may carry a
/// credential value.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Missing required configuration: {}", missing.join(", "))]
    MissingConfig { missing: Vec<&'static str> },

    #[error("Failed to build upstream HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    // ── Upstream transport errors ────────────────────────────────────────────
    #[error("Upstream webhook did not answer within {timeout_ms} ms")]
    UpstreamTimeout { timeout_ms: u128 },

    #[error("Upstream webhook unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Failed to read upstream response body: {0}")]
    UpstreamBody(#[source] reqwest::Error),

    // ── Request errors ───────────────────────────────────────────────────────
    #[error("Method '{method}' is not allowed on this endpoint")]
    MethodNotAllowed { method: String },
}

impl AppError {
    /// Wraps a reqwest send error, stripping the URL so the webhook address
    /// never reaches the logs.
    pub fn from_send(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout { timeout_ms: timeout.as_millis() }
        } else {
            AppError::UpstreamUnreachable(err.without_url())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::UpstreamTimeout { .. })
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamTimeout { .. }
                | AppError::UpstreamUnreachable(_)
                | AppError::UpstreamBody(_)
        )
    }
}
