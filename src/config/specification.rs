use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::{TradeError, TradeResult};
use crate::exchange::BITSTAMP_API;

pub const ENV_PREFIX: &str = "BITSTAMP";

/// Connection and credential settings for one account.
#[derive(Clone, Deserialize)]
pub struct ExchangeSpecification {
    #[serde(default = "default_ssl_uri")]
    pub ssl_uri: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Bitstamp customer id.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_ssl_uri() -> String {
    BITSTAMP_API.to_string()
}

impl ExchangeSpecification {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ssl_uri: default_ssl_uri(),
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            username: username.into(),
            request_timeout_secs: None,
        }
    }

    /// Loads settings from an optional TOML file, then `BITSTAMP_*`
    /// environment variables (a `.env` file is honoured). Later sources win.
    pub fn load(path: Option<&str>) -> TradeResult<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Self::from_config(settings)
    }

    pub fn from_config(settings: Config) -> TradeResult<Self> {
        let spec: Self = settings.try_deserialize()?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> TradeResult<()> {
        let mut errors = Vec::new();

        if self.ssl_uri.trim().is_empty() {
            errors.push("ssl_uri must not be empty");
        }
        if self.api_key.trim().is_empty() {
            errors.push("api_key must not be empty");
        }
        if self.secret_key.trim().is_empty() {
            errors.push("secret_key must not be empty");
        }
        if self.username.trim().is_empty() {
            errors.push("username must not be empty");
        }
        if self.request_timeout_secs == Some(0) {
            errors.push("request_timeout_secs must be > 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TradeError::Configuration(errors.join(", ")))
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for ExchangeSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeSpecification")
            .field("ssl_uri", &self.ssl_uri)
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("username", &self.username)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::FileFormat;

    fn from_toml(toml: &str) -> TradeResult<ExchangeSpecification> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        ExchangeSpecification::from_config(settings)
    }

    #[test]
    fn test_load_from_toml() {
        let spec = from_toml(
            r#"
            api_key = "key"
            secret_key = "secret"
            username = "123456"
            request_timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(spec.ssl_uri, BITSTAMP_API);
        assert_eq!(spec.api_key, "key");
        assert_eq!(spec.username, "123456");
        assert_eq!(spec.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_ssl_uri_override() {
        let spec = from_toml(
            r#"
            ssl_uri = "https://sandbox.example"
            api_key = "key"
            secret_key = "secret"
            username = "1"
            "#,
        )
        .unwrap();
        assert_eq!(spec.ssl_uri, "https://sandbox.example");
        assert_eq!(spec.request_timeout(), None);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        match from_toml(r#"api_key = "key""#) {
            Err(TradeError::Configuration(msg)) => {
                assert!(msg.contains("secret_key"));
                assert!(msg.contains("username"));
                assert!(!msg.contains("api_key"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut spec = ExchangeSpecification::new("key", "secret", "1");
        spec.request_timeout_secs = Some(0);
        assert!(matches!(spec.validate(), Err(TradeError::Configuration(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let spec = ExchangeSpecification::new("key", "very-secret", "1");
        assert!(!format!("{:?}", spec).contains("very-secret"));
    }
}
