use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::AppError;
use crate::models::EnvPresence;

pub const ENV_WEBHOOK_URL: &str = "CHAT_WEBHOOK_URL";
pub const ENV_BASIC_USER: &str = "CHAT_BASIC_USER";
pub const ENV_BASIC_PASS: &str = "CHAT_BASIC_PASS";
pub const ENV_SHARED_SECRET: &str = "CHAT_SHARED_SECRET";
pub const ENV_ALLOWED_ORIGIN: &str = "ALLOWED_ORIGIN";
pub const ENV_UPSTREAM_TIMEOUT_MS: &str = "UPSTREAM_TIMEOUT_MS";
pub const ENV_PORT: &str = "PORT";
pub const ENV_STATIC_DIR: &str = "STATIC_DIR";

const DEFAULT_ALLOWED_ORIGIN: &str = "*";
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_PORT: u16 = 8080;

/// Everything the relay reads from the environment, parsed once at startup.
///
/// The four upstream values stay optional here: a half-configured deployment
/// still answers `GET` and `OPTIONS`, and only `POST` fails (see
/// [`ProxyConfig::credentials`]).
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub webhook_url: Option<String>,
    pub basic_user: Option<String>,
    pub basic_pass: Option<String>,
    pub shared_secret: Option<String>,
    pub allowed_origin: String,
    pub upstream_timeout: Duration,
    pub port: u16,
    pub static_dir: Option<String>,
}

/// Complete set of values needed to call the upstream webhook.
#[derive(Debug, Clone)]
pub struct UpstreamCredentials {
    pub webhook_url: String,
    pub basic_user: String,
    pub basic_pass: String,
    pub shared_secret: String,
}

impl UpstreamCredentials {
    /// `Authorization` header value: `Basic base64(user:pass)`.
    pub fn basic_auth_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.basic_user, self.basic_pass));
        format!("Basic {token}")
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty strings count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let upstream_timeout_ms = get(ENV_UPSTREAM_TIMEOUT_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_MS);

        Self {
            webhook_url: get(ENV_WEBHOOK_URL),
            basic_user: get(ENV_BASIC_USER),
            basic_pass: get(ENV_BASIC_PASS),
            shared_secret: get(ENV_SHARED_SECRET),
            allowed_origin: get(ENV_ALLOWED_ORIGIN)
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            port: get(ENV_PORT)
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            static_dir: get(ENV_STATIC_DIR),
        }
    }

    /// Names of the required upstream values that are absent, in a stable order.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENV_WEBHOOK_URL, &self.webhook_url),
            (ENV_BASIC_USER, &self.basic_user),
            (ENV_BASIC_PASS, &self.basic_pass),
            (ENV_SHARED_SECRET, &self.shared_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Returns the full credential set, or `MissingConfig` naming what is absent.
    pub fn credentials(&self) -> Result<UpstreamCredentials, AppError> {
        match (
            &self.webhook_url,
            &self.basic_user,
            &self.basic_pass,
            &self.shared_secret,
        ) {
            (Some(url), Some(user), Some(pass), Some(secret)) => Ok(UpstreamCredentials {
                webhook_url: url.clone(),
                basic_user: user.clone(),
                basic_pass: pass.clone(),
                shared_secret: secret.clone(),
            }),
            _ => Err(AppError::MissingConfig { missing: self.missing() }),
        }
    }

    pub fn presence(&self) -> EnvPresence {
        EnvPresence {
            webhook_url: self.webhook_url.is_some(),
            basic_user: self.basic_user.is_some(),
            basic_pass: self.basic_pass.is_some(),
            shared_secret: self.shared_secret.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = ProxyConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.allowed_origin, "*");
        assert_eq!(cfg.upstream_timeout, Duration::from_millis(15_000));
        assert_eq!(cfg.port, 8080);
        assert!(cfg.static_dir.is_none());
        assert_eq!(
            cfg.missing(),
            vec![ENV_WEBHOOK_URL, ENV_BASIC_USER, ENV_BASIC_PASS, ENV_SHARED_SECRET]
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        let cfg = ProxyConfig::from_lookup(lookup(&[
            (ENV_WEBHOOK_URL, "https://example.com/webhook"),
            (ENV_BASIC_USER, ""),
            (ENV_BASIC_PASS, "pass"),
            (ENV_SHARED_SECRET, "  "),
        ]));
        assert_eq!(cfg.missing(), vec![ENV_BASIC_USER, ENV_SHARED_SECRET]);
        match cfg.credentials() {
            Err(AppError::MissingConfig { missing }) => {
                assert_eq!(missing, vec![ENV_BASIC_USER, ENV_SHARED_SECRET]);
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }

    #[test]
    fn complete_config_builds_basic_auth_header() {
        let cfg = ProxyConfig::from_lookup(lookup(&[
            (ENV_WEBHOOK_URL, "https://example.com/webhook"),
            (ENV_BASIC_USER, "user"),
            (ENV_BASIC_PASS, "pass"),
            (ENV_SHARED_SECRET, "secret"),
            (ENV_ALLOWED_ORIGIN, "https://site.example"),
            (ENV_UPSTREAM_TIMEOUT_MS, "250"),
        ]));
        let creds = cfg.credentials().unwrap();
        assert_eq!(creds.basic_auth_header(), "Basic dXNlcjpwYXNz");
        assert_eq!(cfg.allowed_origin, "https://site.example");
        assert_eq!(cfg.upstream_timeout, Duration::from_millis(250));
        assert!(cfg.presence().shared_secret);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let cfg = ProxyConfig::from_lookup(lookup(&[
            (ENV_UPSTREAM_TIMEOUT_MS, "soon"),
            (ENV_PORT, "eighty"),
        ]));
        assert_eq!(cfg.upstream_timeout, Duration::from_millis(15_000));
        assert_eq!(cfg.port, 8080);
    }
}
