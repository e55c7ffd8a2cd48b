use crate::core::catalog;
use crate::domain::model::{AnswerSet, Mode};
use chrono::NaiveDate;
use serde::Serialize;

pub const PROTOCOL_VERSION: &str = "v1.0";

/// One answered parameter joined with the option it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationLine {
    pub parameter: &'static str,
    pub option_id: &'static str,
    pub option_title: &'static str,
}

/// Read-only preview of a finished questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolSummary {
    pub mode: Mode,
    pub title: String,
    pub objective: String,
    pub configuration: Vec<ConfigurationLine>,
    pub sequence: &'static [&'static str],
    pub failure_conditions: &'static [&'static str],
    pub repeat: &'static str,
}

impl ProtocolSummary {
    pub fn build(mode: Mode, answers: &AnswerSet) -> Self {
        let configuration = catalog::questions_for(mode)
            .iter()
            .filter_map(|question| {
                let option = question.option(answers.get(question.parameter)?)?;
                Some(ConfigurationLine {
                    parameter: question.parameter,
                    option_id: option.id,
                    option_title: option.title,
                })
            })
            .collect();

        let purpose = answers.get(catalog::purpose_parameter(mode));
        let objective = match mode {
            Mode::Utility => format!(
                "Optimize for {} within specified constraints.",
                purpose
                    .map(|p| p.replacen('-', " ", 1))
                    .unwrap_or_else(|| "primary function".to_string())
            ),
            Mode::Ritual => format!(
                "Cultivate {} state through repeatable ritual.",
                purpose
                    .map(|p| p.to_lowercase())
                    .unwrap_or_else(|| "intentional".to_string())
            ),
        };

        Self {
            mode,
            title: format!("{} PROTOCOL", mode.tag().to_uppercase()),
            objective,
            configuration,
            sequence: catalog::sequence_steps(mode),
            failure_conditions: catalog::failure_conditions(mode),
            repeat: catalog::repeat_instruction(mode),
        }
    }

    pub fn meta_line(date: NaiveDate) -> String {
        format!("{} • {}", PROTOCOL_VERSION, date.format("%b %-d"))
    }

    /// Plain-text rendering for terminals and logs.
    pub fn render(&self, date: NaiveDate) -> String {
        let mut lines = vec![self.title.clone(), Self::meta_line(date), String::new()];

        lines.push("OBJECTIVE".to_string());
        lines.push(self.objective.clone());
        lines.push(String::new());

        lines.push("CONFIGURATION".to_string());
        for line in &self.configuration {
            lines.push(format!("  - {}: {}", line.parameter, line.option_title));
        }
        lines.push(String::new());

        lines.push("SEQUENCE".to_string());
        for (index, step) in self.sequence.iter().enumerate() {
            lines.push(format!("  {}. {}", index + 1, step));
        }
        lines.push(String::new());

        lines.push("FAILURE CONDITIONS".to_string());
        for failure in self.failure_conditions {
            lines.push(format!("  - {}", failure));
        }
        lines.push(String::new());

        lines.push("REPEAT".to_string());
        lines.push(self.repeat.to_string());

        lines.join("\n")
    }
}
