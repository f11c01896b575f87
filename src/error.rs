//! Error types for gpt5-mcp.
//!
//! Startup failures ([`ConfigError`], [`ClientError::MissingApiKey`]) are
//! fatal. Per-call failures ([`ValidationError`], upstream [`ClientError`]s)
//! are turned into a formatted error response by the query pipeline and never
//! reach the transport.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for all gpt5-mcp operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upstream client construction or dispatch failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A tool call carried malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Invalid or missing configuration, detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing required environment variable: {name}")]
    MissingVar {
        /// Variable name.
        name: &'static str,
    },

    /// The API key does not have the expected prefix.
    #[error("{name} must start with '{prefix}'")]
    InvalidApiKey {
        /// Variable name.
        name: &'static str,
        /// Required prefix.
        prefix: &'static str,
    },

    /// A numeric setting could not be parsed.
    #[error("{name} must be an integer, got '{value}'")]
    InvalidNumber {
        /// Setting name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// A numeric setting is outside its allowed range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Setting name.
        name: &'static str,
        /// Parsed value.
        value: u64,
        /// Inclusive minimum.
        min: u64,
        /// Inclusive maximum.
        max: u64,
    },

    /// A numeric setting is below its minimum.
    #[error("{name} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Setting name.
        name: &'static str,
        /// Parsed value.
        value: u64,
        /// Inclusive minimum.
        min: u64,
    },

    /// An enumerated setting has an unknown value.
    #[error("{name} must be one of [{allowed}], got '{value}'")]
    InvalidChoice {
        /// Setting name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Comma-separated allowed values.
        allowed: String,
    },

    /// A boolean setting could not be parsed.
    #[error("{name} must be a boolean (true/false), got '{value}'")]
    InvalidBool {
        /// Setting name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// The defaults file exists but could not be read.
    #[error("Failed to read defaults file {}: {source}", .path.display())]
    DefaultsRead {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The defaults file is not valid JSON for the expected shape.
    #[error("Failed to parse defaults file {}: {source}", .path.display())]
    DefaultsParse {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns a short remedy for the operator.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::MissingVar { .. } | Self::InvalidApiKey { .. } => {
                "Set OPENAI_API_KEY to a valid OpenAI API key (sk-...)."
            }
            Self::InvalidNumber { .. } | Self::OutOfRange { .. } | Self::BelowMinimum { .. } => {
                "Check REQUEST_TIMEOUT_MS (>= 1000), MAX_RETRIES (0-10) and RETRY_DELAY_MS (>= 100)."
            }
            Self::InvalidChoice { .. } | Self::InvalidBool { .. } => {
                "Check DEFAULT_MODEL, LOG_LEVEL, LOG_REQUESTS and LOG_RESPONSES."
            }
            Self::DefaultsRead { .. } | Self::DefaultsParse { .. } => {
                "Fix or remove the defaults file, or point --config at a valid one."
            }
        }
    }
}

/// Upstream client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No API key was supplied when constructing the client.
    #[error("OpenAI API key is required")]
    MissingApiKey,

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {message}")]
    HttpClient {
        /// Error message.
        message: String,
    },

    /// The upstream API rejected the request.
    #[error("OpenAI API error{}: {message}", status_suffix(.status, .code))]
    Api {
        /// Error message from the API.
        message: String,
        /// HTTP status code, when known.
        status: Option<u16>,
        /// API error code (e.g. `invalid_api_key`), when known.
        code: Option<String>,
    },

    /// Any other failure during dispatch.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Remedy shown next to a fatal startup error.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::Config(e) => e.hint(),
            Self::Client(ClientError::MissingApiKey) => {
                "Set OPENAI_API_KEY to a valid OpenAI API key (sk-...)."
            }
            Self::Client(_) => "Check OPENAI_BASE_URL and network access to the OpenAI API.",
            Self::Validation(_) => "Pass a JSON object with a string `prompt` field.",
        }
    }
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>, code: &Option<String>) -> String {
    match (status, code) {
        (Some(s), Some(c)) => format!(" ({s}, {c})"),
        (Some(s), None) => format!(" ({s})"),
        (None, Some(c)) => format!(" ({c})"),
        (None, None) => String::new(),
    }
}

/// Malformed tool-call input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Arguments were absent or not a JSON object.
    #[error("Invalid request: must be an object")]
    NotAnObject,

    /// `prompt` was missing, not a string, or empty.
    #[error("Invalid request: prompt is required and must be a string")]
    MissingPrompt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::NotAnObject.to_string(),
            "Invalid request: must be an object"
        );
        assert_eq!(
            ValidationError::MissingPrompt.to_string(),
            "Invalid request: prompt is required and must be a string"
        );
    }

    #[test]
    fn test_api_error_message() {
        let err = ClientError::Api {
            message: "Incorrect API key provided".to_string(),
            status: Some(401),
            code: Some("invalid_api_key".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "OpenAI API error (401, invalid_api_key): Incorrect API key provided"
        );

        let err = ClientError::Api {
            message: "bad".to_string(),
            status: None,
            code: None,
        };
        assert_eq!(err.to_string(), "OpenAI API error: bad");
    }

    #[test]
    fn test_error_is_transparent() {
        let err: Error = ClientError::MissingApiKey.into();
        assert_eq!(err.to_string(), "OpenAI API key is required");
    }

    #[test]
    fn test_config_hint() {
        let err = ConfigError::MissingVar {
            name: "OPENAI_API_KEY",
        };
        assert!(err.hint().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_error_hint() {
        let err: Error = ClientError::MissingApiKey.into();
        assert!(err.hint().contains("OPENAI_API_KEY"));

        let err: Error = ConfigError::InvalidBool {
            name: "LOG_REQUESTS",
            value: "maybe".to_string(),
        }
        .into();
        assert!(err.hint().contains("LOG_REQUESTS"));
    }
}
