use crate::utils::error::{ProtocolError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file for the terminal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub submission: Option<SubmissionConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub counter_path: Option<String>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ProtocolError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.submission.as_ref()?.endpoint.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.submission.as_ref()?.timeout_seconds
    }

    pub fn counter_path(&self) -> Option<&str> {
        self.storage.as_ref()?.counter_path.as_deref()
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = self.endpoint() {
            validate_url("submission.endpoint", endpoint)?;
        }
        if let Some(timeout) = self.timeout_seconds() {
            validate_range("submission.timeout_seconds", timeout, 1, 120)?;
        }
        if let Some(path) = self.counter_path() {
            validate_path("storage.counter_path", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = FileConfig::from_toml_str(
            r#"
[submission]
endpoint = "https://coffee.example.com/.netlify/functions/generate"
timeout_seconds = 15

[storage]
counter_path = "/tmp/coffee/counter.json"
"#,
        )
        .unwrap();

        assert_eq!(
            config.endpoint(),
            Some("https://coffee.example.com/.netlify/functions/generate")
        );
        assert_eq!(config.timeout_seconds(), Some(15));
        assert_eq!(config.counter_path(), Some("/tmp/coffee/counter.json"));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.endpoint().is_none());
        assert!(config.counter_path().is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(FileConfig::from_toml_str("[submission]\nendpoint = \"ftp://nope\"").is_err());
        assert!(FileConfig::from_toml_str("[submission]\ntimeout_seconds = 0").is_err());
        assert!(matches!(
            FileConfig::from_toml_str("[submission\n"),
            Err(ProtocolError::TomlError(_))
        ));
    }
}
