//! Runtime configuration read from the environment.
//!
//! Every setting has a default except the Gemini API key. A `.env` file in the
//! working directory (or the file named by `NANOGATE_ENV_FILE`) is loaded
//! first, without overriding variables that are already set.

use std::fmt::Display;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::gemini::DEFAULT_API_BASE;
use crate::llm::{CandidateModel, CascadingSelector, LLMError, RetryPolicy};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODELS: &[&str] = &[
    "gemini-2.5-flash-image-preview",
    "gemini-2.0-flash-preview-image-generation",
    "gemini-2.0-flash-exp",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing Gemini API key: set NANO_BANANA_API_KEY or GEMINI_API_KEY")]
    MissingApiKey,
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to read env file: {0}")]
    EnvFile(String),
}

/// Which client serves the text features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBackend {
    /// The built-in Gemini REST client.
    Rest,
    /// A rig Gemini agent. Text-only.
    Rig,
}

impl FromStr for TextBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(TextBackend::Rest),
            "rig" => Ok(TextBackend::Rig),
            other => Err(format!("expected `rest` or `rig`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub api_key: String,
    pub port: u16,
    pub api_base: String,
    pub text_model: String,
    pub text_backend: TextBackend,
    pub image_models: Vec<CandidateModel>,
    pub retry: RetryPolicy,
    /// Wrap every cascade candidate in `retry` as well.
    pub retry_candidates: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::var("NANOGATE_ENV_FILE") {
            return Self::from_env_file(path);
        }
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Loads `path` into the process environment, then reads the settings.
    /// Variables that are already set take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenv::from_path(path.as_ref()).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("NANO_BANANA_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let image_models = match get("NANOGATE_IMAGE_MODELS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(CandidateModel::new)
                .collect::<Vec<_>>(),
            None => DEFAULT_IMAGE_MODELS
                .iter()
                .copied()
                .map(CandidateModel::new)
                .collect(),
        };
        if image_models.is_empty() {
            return Err(ConfigError::Invalid {
                key: "NANOGATE_IMAGE_MODELS",
                reason: "at least one model is required".to_string(),
            });
        }

        let initial_delay = match get("NANOGATE_INITIAL_DELAY") {
            Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| {
                ConfigError::Invalid {
                    key: "NANOGATE_INITIAL_DELAY",
                    reason: e.to_string(),
                }
            })?,
            None => Duration::from_millis(2000),
        };
        let multiplier: f64 = parse(&get, "NANOGATE_BACKOFF_MULTIPLIER", 1.5)?;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: "NANOGATE_BACKOFF_MULTIPLIER",
                reason: format!("must be a finite number >= 1.0, got {multiplier}"),
            });
        }

        let mut retry = RetryPolicy::new(
            parse(&get, "NANOGATE_MAX_ATTEMPTS", 3)?,
            initial_delay,
            multiplier,
        );
        if parse_flag(&get, "NANOGATE_RETRY_RATE_LIMITS")? {
            retry = retry.retry_rate_limits();
        }
        if parse_flag(&get, "NANOGATE_RETRY_NETWORK_ERRORS")? {
            retry = retry.retry_network_errors();
        }

        Ok(Self {
            api_key,
            port: parse(&get, "PORT", DEFAULT_PORT)?,
            api_base: get("NANOGATE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            text_model: get("NANOGATE_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            text_backend: parse(&get, "NANOGATE_TEXT_BACKEND", TextBackend::Rest)?,
            image_models,
            retry,
            retry_candidates: parse_flag(&get, "NANOGATE_RETRY_CANDIDATES")?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// The image cascade over the configured candidates.
    pub fn selector(&self) -> Result<CascadingSelector, LLMError> {
        let selector = CascadingSelector::new(self.image_models.clone())?;
        Ok(if self.retry_candidates {
            selector.with_retry(self.retry.clone())
        } else {
            selector
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, key: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_need_only_an_api_key() {
        let config = GatewayConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "key")])).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.port, 5000);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.text_backend, TextBackend::Rest);
        assert_eq!(config.image_models.len(), 3);
        assert_eq!(config.image_models[0].name(), "gemini-2.5-flash-image-preview");
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(!config.retry_candidates);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn nano_banana_key_wins() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("NANO_BANANA_API_KEY", "banana"),
            ("GEMINI_API_KEY", "gemini"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "banana");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = GatewayConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("PORT", "8080"),
            ("NANOGATE_TEXT_BACKEND", "RIG"),
            ("NANOGATE_IMAGE_MODELS", " model-a , ,model-b "),
            ("NANOGATE_MAX_ATTEMPTS", "5"),
            ("NANOGATE_INITIAL_DELAY", "500ms"),
            ("NANOGATE_BACKOFF_MULTIPLIER", "2"),
            ("NANOGATE_RETRY_RATE_LIMITS", "true"),
            ("NANOGATE_RETRY_NETWORK_ERRORS", "on"),
            ("NANOGATE_RETRY_CANDIDATES", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.text_backend, TextBackend::Rig);
        assert_eq!(
            config.image_models,
            vec![CandidateModel::new("model-a"), CandidateModel::new("model-b")]
        );
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(500));
        assert_eq!(config.retry.multiplier, 2.0);
        assert!(config.retry.transient.matches("429 Too Many Requests"));
        assert!(config.retry.transient.matches("operation timed out"));
        assert!(config.retry_candidates);
        assert_eq!(config.selector().unwrap().candidates().len(), 2);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("NANOGATE_INITIAL_DELAY", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NANOGATE_INITIAL_DELAY", .. }));

        let err = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("NANOGATE_BACKOFF_MULTIPLIER", "0.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NANOGATE_BACKOFF_MULTIPLIER", .. }));

        let err = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("NANOGATE_IMAGE_MODELS", " , "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NANOGATE_IMAGE_MODELS", .. }));

        let err = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("NANOGATE_RETRY_CANDIDATES", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NANOGATE_RETRY_CANDIDATES", .. }));
    }

    #[test]
    fn reads_an_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NANO_BANANA_API_KEY=from-file").unwrap();
        writeln!(file, "NANOGATE_TEXT_MODEL=gemini-2.0-flash").unwrap();
        writeln!(file, "NANOGATE_MAX_ATTEMPTS=4").unwrap();

        let config = GatewayConfig::from_env_file(file.path()).unwrap();
        assert!(!config.api_key.is_empty());
        assert_eq!(config.text_model, "gemini-2.0-flash");
        assert_eq!(config.retry.max_attempts, 4);
    }

    #[test]
    fn missing_env_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = GatewayConfig::from_env_file(dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile(_)));
    }
}
