pub mod catalog;
pub mod protocol;
pub mod questionnaire;
pub mod submission;

pub use crate::domain::model::{AnswerSet, Mode, Question, QuestionOption, SubmissionRequest, SubmissionResult};
pub use crate::domain::ports::{CounterStore, DocumentApi, SubmissionGateway};
pub use crate::utils::error::Result;
