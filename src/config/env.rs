use crate::utils::error::{ProtocolError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.notion.com";

/// Submission handler settings read from the process environment.
///
/// Credentials are optional at load time; the handler checks them per request so a
/// misconfigured deployment still answers with a structured error.
#[derive(Clone)]
pub struct HandlerEnv {
    pub notion_token: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Resolved credentials for one outbound call.
pub struct NotionCredentials<'a> {
    pub token: &'a str,
    pub database_id: &'a str,
}

impl HandlerEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 空字串視為未設定
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            notion_token: non_empty("NOTION_TOKEN"),
            database_id: non_empty("NOTION_DATABASE_ID"),
            api_base: non_empty("NOTION_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_seconds: parse_or("NOTION_TIMEOUT_SECONDS", non_empty("NOTION_TIMEOUT_SECONDS"), 10),
            max_retries: parse_or("NOTION_MAX_RETRIES", non_empty("NOTION_MAX_RETRIES"), 0),
            retry_delay_ms: parse_or("NOTION_RETRY_DELAY_MS", non_empty("NOTION_RETRY_DELAY_MS"), 500),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Both credentials, or `Misconfigured` naming every missing variable.
    pub fn credentials(&self) -> Result<NotionCredentials<'_>> {
        match (self.notion_token.as_deref(), self.database_id.as_deref()) {
            (Some(token), Some(database_id)) => Ok(NotionCredentials { token, database_id }),
            (token, database_id) => {
                let mut missing = Vec::new();
                if token.is_none() {
                    missing.push("NOTION_TOKEN");
                }
                if database_id.is_none() {
                    missing.push("NOTION_DATABASE_ID");
                }
                let message = if database_id.is_none() {
                    "Notion database ID not configured"
                } else {
                    "Notion token not configured"
                };
                Err(ProtocolError::Misconfigured {
                    message: message.to_string(),
                    missing,
                })
            }
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy + fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("⚠️ Ignoring invalid {}='{}', using {}", key, value, default);
            default
        }),
        None => default,
    }
}

impl fmt::Debug for HandlerEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("HandlerEnv")
            .field("notion_token", &redact(&self.notion_token))
            .field("database_id", &redact(&self.database_id))
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

impl Validate for HandlerEnv {
    fn validate(&self) -> Result<()> {
        validate_url("NOTION_API_BASE", &self.api_base)?;
        validate_range("NOTION_TIMEOUT_SECONDS", self.timeout_seconds, 1, 120)?;
        validate_range("NOTION_MAX_RETRIES", self.max_retries, 0, 3)?;
        validate_range("NOTION_RETRY_DELAY_MS", self.retry_delay_ms, 0, 10_000)?;
        Ok(())
    }
}
