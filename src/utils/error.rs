use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("Invalid JSON body: {message}")]
    MalformedInput { message: String },

    #[error("Missing required fields: {}", missing.join(", "))]
    ValidationFailed {
        missing: Vec<String>,
        received: Vec<String>,
    },

    #[error("{message}")]
    Misconfigured {
        message: String,
        missing: Vec<&'static str>,
    },

    #[error("Upstream request failed: {message}")]
    UpstreamFailure {
        status: Option<u16>,
        code: Option<String>,
        message: String,
        details: Option<Value>,
    },

    #[error("Network request failed: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid questionnaire state: {message}")]
    InvalidState { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MethodNotAllowed,
    MalformedInput,
    ValidationFailed,
    Misconfigured,
    UpstreamFailure,
    NetworkFailure,
    Local,
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            ProtocolError::MalformedInput { .. } => ErrorKind::MalformedInput,
            ProtocolError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            ProtocolError::Misconfigured { .. }
            | ProtocolError::ConfigError { .. }
            | ProtocolError::InvalidConfigValueError { .. } => ErrorKind::Misconfigured,
            ProtocolError::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
            ProtocolError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            ProtocolError::IoError(_)
            | ProtocolError::SerializationError(_)
            | ProtocolError::TomlError(_)
            | ProtocolError::InvalidState { .. } => ErrorKind::Local,
        }
    }

    /// HTTP status the handler answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::MalformedInput | ErrorKind::ValidationFailed => 400,
            _ => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProtocolError::UpstreamFailure {
                message, details, ..
            } => match details {
                Some(details) => {
                    let pretty = serde_json::to_string_pretty(details)
                        .unwrap_or_else(|_| details.to_string());
                    format!("{}\n\nDetails:\n{}", message, pretty)
                }
                None => message.clone(),
            },
            ProtocolError::NetworkFailure(e) => {
                format!("Could not reach the submission service: {}", e)
            }
            ProtocolError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration for '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::MethodNotAllowed | ErrorKind::MalformedInput => {
                "Send a POST request with a JSON body"
            }
            ErrorKind::ValidationFailed => "Answer every question before submitting",
            ErrorKind::Misconfigured => {
                "Check NOTION_TOKEN, NOTION_DATABASE_ID and the CLI configuration"
            }
            ErrorKind::UpstreamFailure | ErrorKind::NetworkFailure => "Please try again",
            ErrorKind::Local => "Check the local files and try again",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
