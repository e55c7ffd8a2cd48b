pub mod cli;
pub mod env;
pub mod toml_config;

use crate::domain::model::Mode;
use crate::utils::error::{ProtocolError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use std::time::Duration;
#[cfg(feature = "cli")]
use toml_config::FileConfig;

pub const DEFAULT_COUNTER_PATH: &str = "./.coffee-protocol/counter.json";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "coffee-protocol")]
#[command(about = "Answer a few questions and publish your coffee protocol to Notion")]
pub struct CliConfig {
    #[arg(long, help = "Questionnaire to run: utility or ritual")]
    pub mode: Option<String>,

    #[arg(long, help = "Remote submission handler URL; runs the handler in-process when omitted")]
    pub endpoint: Option<String>,

    #[arg(long, help = "File holding the local system counter")]
    pub counter_path: Option<String>,

    #[arg(long, help = "Optional TOML settings file")]
    pub config: Option<String>,

    #[arg(long = "answer", value_name = "PARAMETER=OPTION", help = "Pre-answer a question (repeatable)")]
    pub answers: Vec<String>,

    #[arg(long, help = "Submit after review without asking")]
    pub yes: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Client settings after merging CLI flags over the settings file.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub mode: Option<Mode>,
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    pub counter_path: String,
    pub preset_answers: Vec<(String, String)>,
    pub auto_submit: bool,
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// `"Primary Function=alertness"` -> `("Primary Function", "alertness")`.
pub fn parse_answer_flag(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((parameter, option)) if !parameter.trim().is_empty() && !option.trim().is_empty() => {
            Ok((parameter.trim().to_string(), option.trim().to_string()))
        }
        _ => Err(ProtocolError::InvalidConfigValueError {
            field: "answer".to_string(),
            value: raw.to_string(),
            reason: "Expected PARAMETER=OPTION".to_string(),
        }),
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<ClientSettings> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let settings = ClientSettings {
            mode: self.mode.as_deref().map(str::parse::<Mode>).transpose()?,
            endpoint: self
                .endpoint
                .clone()
                .or_else(|| file.endpoint().map(str::to_string)),
            timeout_seconds: file.timeout_seconds().unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            counter_path: self
                .counter_path
                .clone()
                .or_else(|| file.counter_path().map(str::to_string))
                .unwrap_or_else(|| DEFAULT_COUNTER_PATH.to_string()),
            preset_answers: self
                .answers
                .iter()
                .map(|raw| parse_answer_flag(raw))
                .collect::<Result<_>>()?,
            auto_submit: self.yes,
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for ClientSettings {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            validate_url("endpoint", endpoint)?;
        }
        validate_range("timeout_seconds", self.timeout_seconds, 1, 120)?;
        validate_path("counter_path", &self.counter_path)?;
        Ok(())
    }
}
