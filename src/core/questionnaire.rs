use crate::core::catalog;
use crate::core::protocol::ProtocolSummary;
use crate::domain::model::{AnswerSet, Mode, Question, SubmissionRequest, SubmissionResult};
use crate::domain::ports::{CounterStore, SubmissionGateway};
use crate::utils::error::{ProtocolError, Result};
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    SelectingMode,
    Answering,
    Reviewing,
    Submitting,
    Success { document_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectMode(Mode),
    SelectOption { parameter: String, option_id: String },
    Next,
    Previous,
    Edit,
    BeginSubmit,
    SubmitSucceeded { document_url: String },
    SubmitFailed { message: String },
    Reset,
}

/// Snapshot of one questionnaire session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionnaireState {
    phase: Phase,
    mode: Option<Mode>,
    current_index: usize,
    answers: AnswerSet,
    last_error: Option<String>,
}

impl Default for QuestionnaireState {
    fn default() -> Self {
        Self {
            phase: Phase::SelectingMode,
            mode: None,
            current_index: 0,
            answers: AnswerSet::new(),
            last_error: None,
        }
    }
}

impl QuestionnaireState {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Message from the most recent failed submission, cleared on the next transition out of review.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn questions(&self) -> &'static [Question] {
        self.mode.map(catalog::questions_for).unwrap_or(&[])
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        match self.phase {
            Phase::Answering | Phase::Reviewing => self.questions().get(self.current_index),
            _ => None,
        }
    }

    pub fn is_current_answered(&self) -> bool {
        self.current_question()
            .is_some_and(|question| self.answers.contains(question.parameter))
    }

    pub fn is_complete(&self) -> bool {
        let questions = self.questions();
        !questions.is_empty()
            && questions
                .iter()
                .all(|question| self.answers.contains(question.parameter))
    }

    /// Parameters still lacking an answer, in question order.
    pub fn unanswered(&self) -> Vec<&'static str> {
        self.questions()
            .iter()
            .filter(|question| !self.answers.contains(question.parameter))
            .map(|question| question.parameter)
            .collect()
    }

    /// Applies one action and returns the next state. Actions that are not valid in the
    /// current phase leave the state unchanged.
    pub fn apply(mut self, action: Action) -> Self {
        match (action, self.phase.clone()) {
            (Action::SubmitSucceeded { document_url }, Phase::Submitting) => {
                self.phase = Phase::Success { document_url };
                self.last_error = None;
            }
            (Action::SubmitFailed { message }, Phase::Submitting | Phase::Reviewing) => {
                self.phase = Phase::Reviewing;
                self.last_error = Some(message);
            }
            (_, Phase::Submitting) => {
                tracing::debug!("Ignoring action while a submission is in flight");
            }
            (Action::SelectMode(mode), _) => {
                self.phase = Phase::Answering;
                self.mode = Some(mode);
                self.current_index = 0;
                self.answers.clear();
                self.last_error = None;
            }
            (Action::SelectOption { parameter, option_id }, Phase::Answering) => {
                match self.current_question() {
                    Some(question)
                        if question.parameter == parameter && question.has_option(&option_id) =>
                    {
                        self.answers.insert(parameter, option_id);
                    }
                    _ => {
                        tracing::debug!(
                            "Ignoring selection '{}' for '{}': not an option of the current question",
                            option_id,
                            parameter
                        );
                    }
                }
            }
            (Action::Next, Phase::Answering) => {
                if self.is_current_answered() {
                    if self.current_index + 1 >= self.questions().len() {
                        self.phase = Phase::Reviewing;
                    } else {
                        self.current_index += 1;
                    }
                }
            }
            (Action::Previous, Phase::Answering) => {
                self.current_index = self.current_index.saturating_sub(1);
            }
            (Action::Edit, Phase::Reviewing) => {
                self.phase = Phase::Answering;
                self.last_error = None;
            }
            (Action::BeginSubmit, Phase::Reviewing) => {
                if self.is_complete() {
                    self.phase = Phase::Submitting;
                }
            }
            (Action::Reset, _) => {
                self = Self::default();
            }
            (action, phase) => {
                tracing::debug!("Action {:?} has no effect in phase {:?}", action, phase);
            }
        }
        self
    }
}

/// Owns one questionnaire session and drives it through submission.
#[derive(Debug, Default)]
pub struct Questionnaire {
    state: QuestionnaireState,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts directly at the first question of `mode`.
    pub fn with_mode(mode: Mode) -> Self {
        let mut questionnaire = Self::new();
        questionnaire.select_mode(mode);
        questionnaire
    }

    pub fn state(&self) -> &QuestionnaireState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> &QuestionnaireState {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(action);
        &self.state
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.dispatch(Action::SelectMode(mode));
    }

    pub fn select_option(&mut self, parameter: &str, option_id: &str) {
        self.dispatch(Action::SelectOption {
            parameter: parameter.to_string(),
            option_id: option_id.to_string(),
        });
    }

    pub fn go_next(&mut self) {
        self.dispatch(Action::Next);
    }

    pub fn go_previous(&mut self) {
        self.dispatch(Action::Previous);
    }

    pub fn edit(&mut self) {
        self.dispatch(Action::Edit);
    }

    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
    }

    pub fn build_summary(&self) -> Option<ProtocolSummary> {
        self.state
            .mode
            .map(|mode| ProtocolSummary::build(mode, &self.state.answers))
    }

    /// Builds the payload for the handler. Fails unless every question has an answer.
    pub fn build_request(&self, counter: u64, now: DateTime<Utc>) -> Result<SubmissionRequest> {
        let mode = self.state.mode.ok_or_else(|| ProtocolError::InvalidState {
            message: "No mode selected".to_string(),
        })?;

        if !self.state.is_complete() {
            return Err(ProtocolError::ValidationFailed {
                missing: self
                    .state
                    .unanswered()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                received: self
                    .state
                    .answers
                    .iter()
                    .map(|(parameter, _)| parameter.to_string())
                    .collect(),
            });
        }

        Ok(SubmissionRequest {
            mode,
            answers: self.state.answers.clone(),
            system_name: system_name(mode, counter),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Sends the reviewed answers. On failure the session returns to review with its
    /// answers intact so the caller can retry.
    pub async fn submit<G, C>(&mut self, gateway: &G, counter: &C) -> Result<SubmissionResult>
    where
        G: SubmissionGateway + ?Sized,
        C: CounterStore,
    {
        if self.state.phase != Phase::Reviewing {
            return Err(ProtocolError::InvalidState {
                message: format!("Cannot submit from phase {:?}", self.state.phase),
            });
        }

        self.dispatch(Action::BeginSubmit);
        let outcome = self.send(gateway, counter).await;

        match outcome {
            Ok((result, document_url)) => {
                tracing::info!("✅ Protocol created: {}", document_url);
                self.dispatch(Action::SubmitSucceeded { document_url });
                Ok(result)
            }
            Err(e) => {
                tracing::error!("❌ Submission failed: {}", e);
                // 任何失敗都回到 Reviewing 並帶著訊息
                self.dispatch(Action::SubmitFailed {
                    message: e.user_friendly_message(),
                });
                Err(e)
            }
        }
    }

    async fn send<G, C>(&self, gateway: &G, counter: &C) -> Result<(SubmissionResult, String)>
    where
        G: SubmissionGateway + ?Sized,
        C: CounterStore,
    {
        let count = counter.load().await?;
        let request = self.build_request(count, Utc::now())?;
        tracing::info!("📤 Submitting '{}' ({})", request.system_name, request.mode);

        let result = gateway.submit(&request).await?;
        let document_url = match (result.success, result.document_url.clone()) {
            (true, Some(document_url)) => document_url,
            _ => return Err(failure_from_result(&result, None)),
        };

        if let Err(e) = counter.store(count + 1).await {
            tracing::warn!("⚠️ Failed to persist submission counter: {}", e);
        }
        Ok((result, document_url))
    }
}

/// `"<Utility|Ritual> System <n>"` where `n` is the persisted counter plus one.
pub fn system_name(mode: Mode, counter: u64) -> String {
    format!("{} System {}", mode.label(), counter + 1)
}

/// Turns a non-successful handler response into an error carrying its message and details.
pub fn failure_from_result(result: &SubmissionResult, http_status: Option<u16>) -> ProtocolError {
    let message = result
        .message
        .clone()
        .or_else(|| result.error.clone())
        .unwrap_or_else(|| match http_status {
            Some(status) => format!("HTTP {}", status),
            None => "Submission failed".to_string(),
        });

    ProtocolError::UpstreamFailure {
        status: http_status,
        code: None,
        message,
        details: result.details.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MemoryCounter(AtomicU64);

    impl CounterStore for MemoryCounter {
        async fn load(&self) -> Result<u64> {
            Ok(self.0.load(Ordering::SeqCst))
        }

        async fn store(&self, value: u64) -> Result<()> {
            self.0.store(value, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedGateway {
        responses: Mutex<Vec<Result<SubmissionResult>>>,
        calls: AtomicUsize,
        last_request: Mutex<Option<SubmissionRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<SubmissionResult>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SubmissionGateway for ScriptedGateway {
        async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn answer_all(questionnaire: &mut Questionnaire) {
        for question in questionnaire.state().questions() {
            questionnaire.select_option(question.parameter, question.options[0].id);
            questionnaire.go_next();
        }
    }

    #[test]
    fn test_initial_state_selects_mode() {
        let questionnaire = Questionnaire::new();
        assert_eq!(questionnaire.state().phase(), &Phase::SelectingMode);
        assert!(questionnaire.state().current_question().is_none());
    }

    #[test]
    fn test_next_requires_answer() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        let before = questionnaire.state().clone();

        questionnaire.go_next();
        assert_eq!(questionnaire.state(), &before);

        questionnaire.select_option("Primary Function", "alertness");
        questionnaire.go_next();
        assert_eq!(questionnaire.state().current_index(), 1);
        assert_eq!(questionnaire.state().phase(), &Phase::Answering);
    }

    #[test]
    fn test_next_on_last_question_enters_review() {
        for mode in Mode::ALL {
            let mut questionnaire = Questionnaire::with_mode(mode);
            let questions = questionnaire.state().questions();
            for question in &questions[..questions.len() - 1] {
                questionnaire.select_option(question.parameter, question.options[0].id);
                questionnaire.go_next();
            }

            let last = &questions[questions.len() - 1];
            let before = questionnaire.state().clone();
            questionnaire.go_next();
            assert_eq!(questionnaire.state(), &before, "unanswered last question must not advance");

            questionnaire.select_option(last.parameter, last.options[0].id);
            questionnaire.go_next();
            assert_eq!(questionnaire.state().phase(), &Phase::Reviewing);
            assert_eq!(questionnaire.state().current_index(), questions.len() - 1);
        }
    }

    #[test]
    fn test_latest_selection_wins() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Ritual);
        questionnaire.select_option("Core Purpose", "agency");
        questionnaire.select_option("Core Purpose", "craft");
        questionnaire.select_option("Core Purpose", "warmth");
        assert_eq!(questionnaire.state().answers().get("Core Purpose"), Some("warmth"));
        assert_eq!(questionnaire.state().answers().len(), 1);
    }

    #[test]
    fn test_invalid_selection_is_ignored() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        questionnaire.select_option("Primary Function", "decaf");
        questionnaire.select_option("Key Constraint", "time");
        assert!(questionnaire.state().answers().is_empty());
    }

    #[test]
    fn test_previous_stops_at_zero() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        questionnaire.go_previous();
        assert_eq!(questionnaire.state().current_index(), 0);

        questionnaire.select_option("Primary Function", "thinking");
        questionnaire.go_next();
        questionnaire.go_previous();
        assert_eq!(questionnaire.state().current_index(), 0);
        assert_eq!(
            questionnaire.state().answers().get("Primary Function"),
            Some("thinking")
        );
    }

    #[test]
    fn test_select_mode_resets_every_time() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        questionnaire.select_option("Primary Function", "alertness");
        questionnaire.go_next();

        questionnaire.select_mode(Mode::Utility);
        assert!(questionnaire.state().answers().is_empty());
        assert_eq!(questionnaire.state().current_index(), 0);

        questionnaire.select_option("Primary Function", "appetite");
        questionnaire.select_mode(Mode::Utility);
        assert!(questionnaire.state().answers().is_empty());
    }

    #[test]
    fn test_edit_returns_to_last_question() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Ritual);
        answer_all(&mut questionnaire);
        assert_eq!(questionnaire.state().phase(), &Phase::Reviewing);

        questionnaire.edit();
        assert_eq!(questionnaire.state().phase(), &Phase::Answering);
        assert_eq!(questionnaire.state().current_index(), 4);
        assert!(questionnaire.state().is_complete());
    }

    #[test]
    fn test_build_summary_is_pure() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        answer_all(&mut questionnaire);
        let first = questionnaire.build_summary();
        let second = questionnaire.build_summary();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_request_rejects_incomplete_answers() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        questionnaire.select_option("Primary Function", "alertness");

        let err = questionnaire.build_request(0, Utc::now()).unwrap_err();
        match err {
            ProtocolError::ValidationFailed { missing, received } => {
                assert_eq!(missing.len(), 4);
                assert_eq!(received, vec!["Primary Function".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_success_increments_counter() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        answer_all(&mut questionnaire);

        let gateway = ScriptedGateway::new(vec![Ok(SubmissionResult::succeeded(
            "https://notion.so/page-1",
        ))]);
        let counter = MemoryCounter(AtomicU64::new(6));

        let result = questionnaire.submit(&gateway, &counter).await.unwrap();

        assert_eq!(result.document_url.as_deref(), Some("https://notion.so/page-1"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 7);
        assert_eq!(
            questionnaire.state().phase(),
            &Phase::Success {
                document_url: "https://notion.so/page-1".to_string()
            }
        );
        let request = gateway.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.system_name, "Utility System 7");
        assert_eq!(request.answers.len(), 5);

        questionnaire.reset();
        assert_eq!(questionnaire.state(), &QuestionnaireState::default());
    }

    #[tokio::test]
    async fn test_submit_failure_returns_to_review_and_allows_retry() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Ritual);
        answer_all(&mut questionnaire);
        let answers_before = questionnaire.state().answers().clone();

        let gateway = ScriptedGateway::new(vec![
            Ok(SubmissionResult::failed(
                "Internal server error",
                Some(serde_json::json!({"status": 429})),
            )),
            Ok(SubmissionResult::succeeded("https://notion.so/page-2")),
        ]);
        let counter = MemoryCounter(AtomicU64::new(0));

        let err = questionnaire.submit(&gateway, &counter).await.unwrap_err();
        assert!(matches!(err, ProtocolError::UpstreamFailure { .. }));
        assert_eq!(questionnaire.state().phase(), &Phase::Reviewing);
        assert_eq!(questionnaire.state().answers(), &answers_before);
        assert!(questionnaire
            .state()
            .last_error()
            .unwrap()
            .starts_with("Internal server error\n\nDetails:\n"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        questionnaire.submit(&gateway, &counter).await.unwrap();
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_outside_review_is_rejected() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        let gateway = ScriptedGateway::new(vec![]);
        let counter = MemoryCounter(AtomicU64::new(0));

        let err = questionnaire.submit(&gateway, &counter).await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidState { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    struct BrokenCounter;

    impl CounterStore for BrokenCounter {
        async fn load(&self) -> Result<u64> {
            Err(ProtocolError::InvalidState {
                message: "counter file is corrupt".to_string(),
            })
        }

        async fn store(&self, _value: u64) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_counter_failure_returns_to_review_with_message() {
        let mut questionnaire = Questionnaire::with_mode(Mode::Utility);
        answer_all(&mut questionnaire);
        let gateway = ScriptedGateway::new(vec![]);

        let err = questionnaire.submit(&gateway, &BrokenCounter).await.unwrap_err();

        assert!(matches!(err, ProtocolError::InvalidState { .. }));
        assert_eq!(questionnaire.state().phase(), &Phase::Reviewing);
        assert!(questionnaire
            .state()
            .last_error()
            .unwrap()
            .contains("counter file is corrupt"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(questionnaire.state().answers().len(), 5);
    }
}
