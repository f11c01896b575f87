//! Server configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables
//! → defaults file → compiled-in defaults. Every value is validated in
//! [`ServerConfigBuilder::build`]; the resulting [`ServerConfig`] is never
//! mutated afterwards.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::request::ModelVariant;

/// API key variable.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Base URL override variable.
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Default model variable.
pub const ENV_DEFAULT_MODEL: &str = "DEFAULT_MODEL";
/// Request timeout variable (milliseconds).
pub const ENV_TIMEOUT: &str = "REQUEST_TIMEOUT_MS";
/// Max retries variable.
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
/// Retry delay variable (milliseconds).
pub const ENV_RETRY_DELAY: &str = "RETRY_DELAY_MS";
/// Server display name variable.
pub const ENV_SERVER_NAME: &str = "SERVER_NAME";
/// Log level variable.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Request logging toggle variable.
pub const ENV_LOG_REQUESTS: &str = "LOG_REQUESTS";
/// Response logging toggle variable.
pub const ENV_LOG_RESPONSES: &str = "LOG_RESPONSES";

/// Required API key prefix.
const API_KEY_PREFIX: &str = "sk";
/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Minimum request timeout in milliseconds.
const MIN_TIMEOUT_MS: u64 = 1_000;
/// Default max retries.
const DEFAULT_MAX_RETRIES: u64 = 3;
/// Maximum accepted max retries.
const MAX_MAX_RETRIES: u64 = 10;
/// Default retry delay in milliseconds.
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
/// Minimum retry delay in milliseconds.
const MIN_RETRY_DELAY_MS: u64 = 100;
/// Default server display name.
const DEFAULT_SERVER_NAME: &str = "gpt5-mcp-server";

/// Log verbosity for the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything, including option fallbacks and per-call details.
    /// Payload logging is toggled separately by `LOG_REQUESTS` and
    /// `LOG_RESPONSES`.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Warnings and errors.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Parses a level name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns the level name, usable as a `tracing` filter directive.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Process-wide settings.
#[derive(Clone)]
pub struct ServerConfig {
    /// `OpenAI` API key.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used when a request does not name one.
    pub default_model: ModelVariant,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts. Accepted for compatibility; nothing retries.
    pub max_retries: u32,
    /// Delay between retries. Accepted for compatibility; nothing retries.
    pub retry_delay: Duration,
    /// Name reported to MCP clients.
    pub server_name: String,
    /// Version reported to MCP clients.
    pub server_version: String,
    /// Log level.
    pub log_level: LogLevel,
    /// Log outbound request payloads.
    pub log_requests: bool,
    /// Log a preview of inbound responses.
    pub log_responses: bool,
}

impl ServerConfig {
    /// Creates a new builder for `ServerConfig`.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Creates configuration from environment variables, falling back to
    /// `defaults` and then to compiled-in values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a missing or malformed API key, an
    /// unparseable or out-of-range number, or an unknown enum value.
    pub fn from_env(defaults: Option<&FileDefaults>) -> Result<Self, ConfigError> {
        Self::builder().from_env()?.file_defaults(defaults)?.build()
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("server_name", &self.server_name)
            .field("server_version", &self.server_version)
            .field("log_level", &self.log_level)
            .field("log_requests", &self.log_requests)
            .field("log_responses", &self.log_responses)
            .finish()
    }
}

/// Fallback settings read from the JSON defaults file.
///
/// ```json
/// {
///   "openai": { "defaultModel": "gpt-5", "timeout": 60000, "maxRetries": 3, "retryDelay": 1000 },
///   "server": { "name": "gpt5-mcp-server", "version": "1.0.0" },
///   "logging": { "level": "info", "logRequests": false, "logResponses": false }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileDefaults {
    /// Upstream API settings.
    pub openai: OpenAiDefaults,
    /// MCP server identity.
    pub server: ServerDefaults,
    /// Logging settings.
    pub logging: LoggingDefaults,
}

/// `openai` section of the defaults file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenAiDefaults {
    /// Base URL override.
    pub base_url: Option<String>,
    /// Default model name.
    pub default_model: Option<String>,
    /// Timeout in milliseconds.
    pub timeout: Option<u64>,
    /// Max retries.
    pub max_retries: Option<u64>,
    /// Retry delay in milliseconds.
    pub retry_delay: Option<u64>,
}

/// `server` section of the defaults file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerDefaults {
    /// Display name.
    pub name: Option<String>,
    /// Version string.
    pub version: Option<String>,
}

/// `logging` section of the defaults file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingDefaults {
    /// Log level name.
    pub level: Option<String>,
    /// Log outbound requests.
    pub log_requests: Option<bool>,
    /// Log inbound responses.
    pub log_responses: Option<bool>,
}

impl FileDefaults {
    /// Reads the defaults file. A missing file yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DefaultsRead`] if the file exists but cannot be
    /// read, or [`ConfigError::DefaultsParse`] if it is not valid JSON.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::DefaultsRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::DefaultsParse {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    default_model: Option<ModelVariant>,
    timeout_ms: Option<u64>,
    max_retries: Option<u64>,
    retry_delay_ms: Option<u64>,
    server_name: Option<String>,
    server_version: Option<String>,
    log_level: Option<LogLevel>,
    log_requests: Option<bool>,
    log_responses: Option<bool>,
}

impl ServerConfigBuilder {
    /// Populates unset fields from the process environment.
    ///
    /// # Errors
    ///
    /// See [`from_vars`](Self::from_vars).
    pub fn from_env(self) -> Result<Self, ConfigError> {
        self.from_vars(|name| std::env::var(name).ok())
    }

    /// Populates unset fields from `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a present value cannot be parsed.
    pub fn from_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = var(ENV_API_KEY);
        }
        if self.base_url.is_none() {
            self.base_url = var(ENV_BASE_URL);
        }
        if self.default_model.is_none() {
            self.default_model = var(ENV_DEFAULT_MODEL)
                .map(|v| parse_model(ENV_DEFAULT_MODEL, &v))
                .transpose()?;
        }
        if self.timeout_ms.is_none() {
            self.timeout_ms = var(ENV_TIMEOUT)
                .map(|v| parse_number(ENV_TIMEOUT, &v))
                .transpose()?;
        }
        if self.max_retries.is_none() {
            self.max_retries = var(ENV_MAX_RETRIES)
                .map(|v| parse_number(ENV_MAX_RETRIES, &v))
                .transpose()?;
        }
        if self.retry_delay_ms.is_none() {
            self.retry_delay_ms = var(ENV_RETRY_DELAY)
                .map(|v| parse_number(ENV_RETRY_DELAY, &v))
                .transpose()?;
        }
        if self.server_name.is_none() {
            self.server_name = var(ENV_SERVER_NAME);
        }
        if self.log_level.is_none() {
            self.log_level = var(ENV_LOG_LEVEL)
                .map(|v| parse_log_level(ENV_LOG_LEVEL, &v))
                .transpose()?;
        }
        if self.log_requests.is_none() {
            self.log_requests = var(ENV_LOG_REQUESTS)
                .map(|v| parse_bool(ENV_LOG_REQUESTS, &v))
                .transpose()?;
        }
        if self.log_responses.is_none() {
            self.log_responses = var(ENV_LOG_RESPONSES)
                .map(|v| parse_bool(ENV_LOG_RESPONSES, &v))
                .transpose()?;
        }
        Ok(self)
    }

    /// Populates unset fields from the defaults file, if one was loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChoice`] for an unknown model or log level.
    pub fn file_defaults(mut self, defaults: Option<&FileDefaults>) -> Result<Self, ConfigError> {
        let Some(file) = defaults else {
            return Ok(self);
        };

        if self.base_url.is_none() {
            self.base_url.clone_from(&file.openai.base_url);
        }
        if self.default_model.is_none() {
            self.default_model = file
                .openai
                .default_model
                .as_deref()
                .map(|v| parse_model("openai.defaultModel", v))
                .transpose()?;
        }
        self.timeout_ms = self.timeout_ms.or(file.openai.timeout);
        self.max_retries = self.max_retries.or(file.openai.max_retries);
        self.retry_delay_ms = self.retry_delay_ms.or(file.openai.retry_delay);
        if self.server_name.is_none() {
            self.server_name.clone_from(&file.server.name);
        }
        if self.server_version.is_none() {
            self.server_version.clone_from(&file.server.version);
        }
        if self.log_level.is_none() {
            self.log_level = file
                .logging
                .level
                .as_deref()
                .map(|v| parse_log_level("logging.level", v))
                .transpose()?;
        }
        self.log_requests = self.log_requests.or(file.logging.log_requests);
        self.log_responses = self.log_responses.or(file.logging.log_responses);
        Ok(self)
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the default model.
    #[must_use]
    pub const fn default_model(mut self, model: ModelVariant) -> Self {
        self.default_model = Some(model);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the max retries.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n as u64);
        self
    }

    /// Sets the retry delay.
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the server display name.
    #[must_use]
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Sets the server version.
    #[must_use]
    pub fn server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    /// Sets the log level.
    #[must_use]
    pub const fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Enables or disables request logging.
    #[must_use]
    pub const fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = Some(enabled);
        self
    }

    /// Enables or disables response logging.
    #[must_use]
    pub const fn log_responses(mut self, enabled: bool) -> Self {
        self.log_responses = Some(enabled);
        self
    }

    /// Validates and builds the [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] if no API key was set,
    /// [`ConfigError::InvalidApiKey`] if it lacks the `sk` prefix, and a range
    /// error for any numeric setting outside its bounds.
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let api_key = self.api_key.ok_or(ConfigError::MissingVar { name: ENV_API_KEY })?;
        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(ConfigError::InvalidApiKey {
                name: ENV_API_KEY,
                prefix: API_KEY_PREFIX,
            });
        }

        let timeout_ms = self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms < MIN_TIMEOUT_MS {
            return Err(ConfigError::BelowMinimum {
                name: ENV_TIMEOUT,
                value: timeout_ms,
                min: MIN_TIMEOUT_MS,
            });
        }

        let max_retries = self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        if max_retries > MAX_MAX_RETRIES {
            return Err(ConfigError::OutOfRange {
                name: ENV_MAX_RETRIES,
                value: max_retries,
                min: 0,
                max: MAX_MAX_RETRIES,
            });
        }

        let retry_delay_ms = self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS);
        if retry_delay_ms < MIN_RETRY_DELAY_MS {
            return Err(ConfigError::BelowMinimum {
                name: ENV_RETRY_DELAY,
                value: retry_delay_ms,
                min: MIN_RETRY_DELAY_MS,
            });
        }

        Ok(ServerConfig {
            api_key,
            base_url: self.base_url,
            default_model: self.default_model.unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            // Bounded by MAX_MAX_RETRIES above.
            max_retries: u32::try_from(max_retries).unwrap_or(u32::MAX),
            retry_delay: Duration::from_millis(retry_delay_ms),
            server_name: self
                .server_name
                .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            server_version: self
                .server_version
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            log_level: self.log_level.unwrap_or_default(),
            log_requests: self.log_requests.unwrap_or(false),
            log_responses: self.log_responses.unwrap_or(false),
        })
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_model(name: &'static str, value: &str) -> Result<ModelVariant, ConfigError> {
    ModelVariant::parse(value.trim()).ok_or_else(|| ConfigError::InvalidChoice {
        name,
        value: value.to_string(),
        allowed: ModelVariant::names(),
    })
}

fn parse_log_level(name: &'static str, value: &str) -> Result<LogLevel, ConfigError> {
    LogLevel::parse(value.trim()).ok_or_else(|| ConfigError::InvalidChoice {
        name,
        value: value.to_string(),
        allowed: "debug, info, warn, error".to_string(),
    })
}
