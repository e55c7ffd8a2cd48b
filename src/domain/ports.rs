use crate::domain::model::{SubmissionRequest, SubmissionResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Persists the local submission counter.
pub trait CounterStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<u64>> + Send;
    fn store(&self, value: u64) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Transport from the questionnaire to the submission handler.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResult>;
}

/// External document service the handler forwards to.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Creates one page and returns its canonical URL.
    async fn create_page(&self, token: &str, page: &Value) -> Result<String>;
}
