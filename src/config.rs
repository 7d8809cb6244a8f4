use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::draft::generator::{ChatModelConfig, TextModelConfig};

pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:3000,*.vercel.app,*.netlify.app,*.onrender.com";
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_TEXT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/google/flan-t5-small";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("BIND_ADDR is not a socket address: {0:?}")]
    InvalidBindAddr(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    /// `None` when `HF_API_KEY` is unset; generation then reports "not configured".
    pub chat_model: Option<ChatModelConfig>,
    pub session_ttl_hours: i64,
    pub sweep_interval: Duration,
    pub upstream_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://taskboard.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_origins: split_list(DEFAULT_CORS_ORIGINS),
            chat_model: None,
            session_ttl_hours: 72,
            sweep_interval: Duration::from_secs(3600),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("BIND_ADDR") {
            Some(addr) => addr
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidBindAddr(addr.clone()))?,
            None => defaults.bind_addr,
        };

        let upstream_timeout = Duration::from_secs(number(
            &lookup,
            "UPSTREAM_TIMEOUT_SECS",
            defaults.upstream_timeout.as_secs(),
        )?);

        let chat_model = lookup("HF_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| ChatModelConfig {
                api_key,
                model: lookup("HF_MODEL_ID").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                base_url: lookup("HF_API_BASE")
                    .unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string()),
                timeout: upstream_timeout,
            });

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr,
            cors_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|origins| split_list(&origins))
                .unwrap_or(defaults.cors_origins),
            chat_model,
            session_ttl_hours: number(&lookup, "SESSION_TTL_HOURS", 72)? as i64,
            sweep_interval: Duration::from_secs(number(
                &lookup,
                "SESSION_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )?),
            upstream_timeout,
        })
    }
}

/// Settings for the gateway client side.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base of the REST surface, e.g. `http://127.0.0.1:5000/api`.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub text_model: Option<TextModelConfig>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(10),
            text_model: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn new_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(number(&lookup, "TASKBOARD_TIMEOUT_SECS", 10)?);
        let text_model = lookup("HF_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| TextModelConfig {
                api_key,
                url: lookup("HF_TEXT_MODEL_URL")
                    .unwrap_or_else(|| DEFAULT_TEXT_MODEL_URL.to_string()),
                timeout,
            });

        Ok(Self {
            base_url: lookup("TASKBOARD_API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5000/api".to_string()),
            token: lookup("TASKBOARD_TOKEN"),
            timeout,
            text_model,
        })
    }
}

fn number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidNumber { name, value }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
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
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://taskboard.db");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert!(config.chat_model.is_none());
        assert!(config.cors_origins.contains(&"*.vercel.app".to_string()));
    }

    #[test]
    fn api_key_enables_chat_model() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HF_API_KEY", "secret"),
            ("UPSTREAM_TIMEOUT_SECS", "4"),
        ]))
        .unwrap();
        let chat = config.chat_model.unwrap();
        assert_eq!(chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(chat.timeout, Duration::from_secs(4));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("SESSION_TTL_HOURS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "SESSION_TTL_HOURS", .. }));
    }

    #[test]
    fn client_config_reads_base_url_and_token() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TASKBOARD_API_URL", "http://example.test/api"),
            ("TASKBOARD_TOKEN", "t0ken"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://example.test/api");
        assert_eq!(config.token.as_deref(), Some("t0ken"));
        assert!(config.text_model.is_none());
    }
}
