//! [`Config`]-related definitions.

use std::{env, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use smart_default::SmartDefault;
use url::Url;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: Server,

    /// Language model and grammar checker configuration.
    #[serde(default)]
    pub language: Language,

    /// Log configuration.
    #[serde(default)]
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the `CONF.*` environment variables (if any);
    /// - overriding the port and the API key with the conventional `PORT`
    ///   and `OPENAI_API_KEY` environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option(
                "language.api_key",
                env::var("OPENAI_API_KEY").ok(),
            )?
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(5000)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// Indicator whether descriptions of upstream failures are included into
    /// error responses.
    pub expose_error_details: bool,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Language model and grammar checker configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Language {
    /// URL of an OpenAI-compatible chat completions endpoint.
    #[default(Url::parse("https://api.openai.com/v1/chat/completions")
        .unwrap_or_else(|e| unreachable!("valid URL: {e}")))]
    pub completions_url: Url,

    /// API key of the chat completions endpoint.
    pub api_key: String,

    /// Model to request completions from.
    #[default("gpt-4".to_owned())]
    pub model: String,

    /// URL of a LanguageTool-compatible `check` endpoint.
    #[default(Url::parse("https://api.languagetool.org/v2/check")
        .unwrap_or_else(|e| unreachable!("valid URL: {e}")))]
    pub grammar_url: Url,

    /// Timeout of a single outbound request.
    #[default(time::Duration::from_secs(60))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,

    /// Indicator whether a rule-based rewrite is returned when the language
    /// model cannot be reached.
    pub fallback: bool,
}

impl From<Language> for service::infra::language::http::Config {
    fn from(value: Language) -> Self {
        let Language {
            completions_url,
            api_key,
            model,
            grammar_url,
            timeout,
            fallback: _,
        } = value;

        Self {
            completions_url,
            api_key: SecretString::from(api_key),
            model,
            grammar_url,
            timeout,
        }
    }
}

impl From<&Language> for service::Config {
    fn from(value: &Language) -> Self {
        Self {
            fallback: value.fallback,
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::Config;

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.cors.origins, ["*"]);
        assert!(!config.server.expose_error_details);
        assert_eq!(config.language.model, "gpt-4");
        assert_eq!(
            config.language.grammar_url.as_str(),
            "https://api.languagetool.org/v2/check",
        );
        assert_eq!(config.language.timeout, Duration::from_secs(60));
        assert!(!config.language.fallback);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::new("definitely/missing/config").unwrap();

        assert_eq!(config.language.model, "gpt-4");
        assert!(config.server.port > 0);
    }
}
