use crate::config::ClientSettings;
use crate::core::questionnaire::{Phase, Questionnaire};
use crate::domain::model::{Mode, Question};
use crate::domain::ports::{CounterStore, SubmissionGateway};
use crate::utils::error::Result;
use chrono::Local;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Submitted(String),
    Quit,
}

/// Answers questions from `--answer` flags in order, stopping at the first gap.
pub fn apply_presets(questionnaire: &mut Questionnaire, presets: &[(String, String)]) {
    while let (Phase::Answering, Some(question)) = (
        questionnaire.state().phase().clone(),
        questionnaire.state().current_question(),
    ) {
        let preset = presets
            .iter()
            .rev()
            .find(|(parameter, _)| parameter == question.parameter);
        let Some((parameter, option_id)) = preset else {
            break;
        };

        questionnaire.select_option(parameter, option_id);
        if !questionnaire.state().is_current_answered() {
            tracing::warn!("⚠️ '{}' is not an option of '{}'", option_id, parameter);
            break;
        }
        questionnaire.go_next();
    }
}

/// Line-oriented renderer for a questionnaire session.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Reads one trimmed line; `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn choose_mode(&mut self) -> Result<Option<Mode>> {
        writeln!(self.output, "\nChoose your path:")?;
        writeln!(self.output, "  [1] Utility - coffee as a tool")?;
        writeln!(self.output, "  [2] Ritual  - coffee as a practice")?;

        loop {
            let Some(input) = self.read_line("Mode (1/2, q = quit): ")? else {
                return Ok(None);
            };
            match input.to_ascii_lowercase().as_str() {
                "1" | "utility" => return Ok(Some(Mode::Utility)),
                "2" | "ritual" => return Ok(Some(Mode::Ritual)),
                "q" => return Ok(None),
                _ => writeln!(self.output, "Please choose 1 or 2.")?,
            }
        }
    }

    fn render_question(&mut self, questionnaire: &Questionnaire, question: &Question) -> Result<()> {
        let state = questionnaire.state();
        let selected = state.answers().get(question.parameter);

        writeln!(
            self.output,
            "\n{} • {} of {}",
            question.parameter,
            state.current_index() + 1,
            state.questions().len()
        )?;
        writeln!(self.output, "{}", question.prompt)?;
        for (index, option) in question.options.iter().enumerate() {
            let marker = if selected == Some(option.id) { "*" } else { " " };
            writeln!(
                self.output,
                " {}[{}] {} - {}",
                marker,
                index + 1,
                option.title,
                option.description
            )?;
        }
        writeln!(self.output, "Systems Concept: {}", question.systems_concept)?;
        Ok(())
    }

    /// Returns `false` when the user quits.
    fn answer_current(&mut self, questionnaire: &mut Questionnaire) -> Result<bool> {
        let Some(question) = questionnaire.state().current_question() else {
            return Ok(true);
        };
        self.render_question(questionnaire, question)?;

        let hint = if questionnaire.state().is_current_answered() {
            "Enter = keep, "
        } else {
            ""
        };
        let prompt = format!(
            "Choose 1-{} ({}b = back, q = quit): ",
            question.options.len(),
            hint
        );
        let Some(input) = self.read_line(&prompt)? else {
            return Ok(false);
        };

        match input.as_str() {
            "q" => return Ok(false),
            "b" => questionnaire.go_previous(),
            "" => questionnaire.go_next(),
            choice => {
                let option = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| question.options.get(index))
                    .or_else(|| question.option(choice));

                match option {
                    Some(option) => {
                        questionnaire.select_option(question.parameter, option.id);
                        questionnaire.go_next();
                    }
                    None => writeln!(self.output, "Unknown option '{}'.", choice)?,
                }
            }
        }
        Ok(true)
    }

    fn render_review(&mut self, questionnaire: &Questionnaire) -> Result<()> {
        if let Some(summary) = questionnaire.build_summary() {
            writeln!(self.output, "\n{}", summary.render(Local::now().date_naive()))?;
        }
        if let Some(error) = questionnaire.state().last_error() {
            writeln!(self.output, "\nError:\n{}\n\nPlease try again.", error)?;
        }
        Ok(())
    }

    /// Drives one questionnaire from mode selection to a created document or a quit.
    pub async fn run_session<G, C>(
        &mut self,
        questionnaire: &mut Questionnaire,
        settings: &ClientSettings,
        gateway: &G,
        counter: &C,
    ) -> Result<SessionOutcome>
    where
        G: SubmissionGateway + ?Sized,
        C: CounterStore,
    {
        loop {
            match questionnaire.state().phase().clone() {
                Phase::SelectingMode => {
                    let mode = match settings.mode {
                        Some(mode) => Some(mode),
                        None => self.choose_mode()?,
                    };
                    let Some(mode) = mode else {
                        return Ok(SessionOutcome::Quit);
                    };
                    questionnaire.select_mode(mode);
                    apply_presets(questionnaire, &settings.preset_answers);
                }
                Phase::Answering => {
                    if !self.answer_current(questionnaire)? {
                        return Ok(SessionOutcome::Quit);
                    }
                }
                Phase::Reviewing => {
                    self.render_review(questionnaire)?;

                    let auto = settings.auto_submit && questionnaire.state().last_error().is_none();
                    let choice = if auto {
                        "s".to_string()
                    } else {
                        match self.read_line("\n[s] Generate protocol  [e] Edit  [q] Quit: ")? {
                            Some(choice) => choice.to_ascii_lowercase(),
                            None => return Ok(SessionOutcome::Quit),
                        }
                    };

                    match choice.as_str() {
                        "s" => {
                            writeln!(self.output, "\nGenerating your protocol...")?;
                            // 失敗時狀態會回到 Reviewing 並帶著錯誤訊息
                            if let Err(e) = questionnaire.submit(gateway, counter).await {
                                tracing::debug!("Submission error kind: {:?}", e.kind());
                                if questionnaire.state().last_error().is_none() {
                                    writeln!(self.output, "\nError:\n{}", e.user_friendly_message())?;
                                    return Ok(SessionOutcome::Quit);
                                }
                            }
                        }
                        "e" => questionnaire.edit(),
                        "q" => return Ok(SessionOutcome::Quit),
                        other => writeln!(self.output, "Unknown choice '{}'.", other)?,
                    }
                }
                Phase::Submitting => {
                    // submit() 完成前不會停在這個階段
                    return Ok(SessionOutcome::Quit);
                }
                Phase::Success { document_url } => {
                    writeln!(self.output, "\n✅ Protocol created: {}", document_url)?;
                    return Ok(SessionOutcome::Submitted(document_url));
                }
            }
        }
    }

    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(matches!(
            self.read_line(prompt)?.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y") | Some("yes")
        ))
    }
}
