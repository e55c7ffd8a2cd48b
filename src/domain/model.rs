use crate::utils::error::{ProtocolError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 問卷類別，決定使用哪一組問題
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Utility,
    Ritual,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Utility, Mode::Ritual];

    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Utility => "utility",
            Mode::Ritual => "ritual",
        }
    }

    /// Capitalised label used in generated system names.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Utility => "Utility",
            Mode::Ritual => "Ritual",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Mode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utility" => Ok(Mode::Utility),
            "ritual" => Ok(Mode::Ritual),
            other => Err(ProtocolError::InvalidConfigValueError {
                field: "mode".to_string(),
                value: other.to_string(),
                reason: "Mode must be 'utility' or 'ritual'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOption {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub ordinal: usize,
    pub parameter: &'static str,
    pub prompt: &'static str,
    pub systems_concept: &'static str,
    pub options: &'static [QuestionOption],
}

impl Question {
    pub fn option(&self, id: &str) -> Option<&'static QuestionOption> {
        self.options.iter().find(|option| option.id == id)
    }

    pub fn has_option(&self, id: &str) -> bool {
        self.option(id).is_some()
    }
}

/// Selected option id per parameter, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(IndexMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option_id` for `parameter`, replacing any earlier selection in place.
    pub fn insert(&mut self, parameter: impl Into<String>, option_id: impl Into<String>) {
        self.0.insert(parameter.into(), option_id.into());
    }

    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.0.get(parameter).map(String::as_str)
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.0.contains_key(parameter)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Payload sent from the questionnaire to the submission handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub mode: Mode,
    pub answers: AnswerSet,
    pub system_name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(default, alias = "pageUrl", skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SubmissionResult {
    pub fn succeeded(document_url: impl Into<String>) -> Self {
        Self {
            success: true,
            document_url: Some(document_url.into()),
            error: None,
            message: None,
            details: None,
        }
    }

    pub fn failed(error: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            document_url: None,
            error: Some(error.into()),
            message: None,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_set_keeps_latest_selection_in_place() {
        let mut answers = AnswerSet::new();
        answers.insert("Primary Function", "alertness");
        answers.insert("Key Constraint", "time");
        answers.insert("Primary Function", "thinking");

        assert_eq!(answers.len(), 2);
        assert_eq!(answers.get("Primary Function"), Some("thinking"));
        let keys: Vec<&str> = answers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Primary Function", "Key Constraint"]);
    }

    #[test]
    fn test_submission_request_wire_format() {
        let request = SubmissionRequest {
            mode: Mode::Utility,
            answers: [("Time Budget", "2"), ("Cost Parameter", "under-50")]
                .into_iter()
                .collect(),
            system_name: "Utility System 1".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mode"], "utility");
        assert_eq!(json["systemName"], "Utility System 1");
        assert_eq!(json["answers"]["Time Budget"], "2");

        let text = serde_json::to_string(&request).unwrap();
        assert!(text.find("Time Budget").unwrap() < text.find("Cost Parameter").unwrap());

        let parsed: SubmissionRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, request);
        let keys: Vec<&str> = parsed.answers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Time Budget", "Cost Parameter"]);
    }

    #[test]
    fn test_result_accepts_legacy_page_url() {
        let result: SubmissionResult =
            serde_json::from_str(r#"{"success": true, "pageUrl": "https://notion.so/abc"}"#).unwrap();
        assert_eq!(result.document_url.as_deref(), Some("https://notion.so/abc"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Utility".parse::<Mode>().unwrap(), Mode::Utility);
        assert_eq!(" ritual ".parse::<Mode>().unwrap(), Mode::Ritual);
        assert!("espresso".parse::<Mode>().is_err());
    }
}
