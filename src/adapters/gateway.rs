use crate::core::questionnaire::failure_from_result;
use crate::core::submission::{HandlerRequest, SubmissionHandler};
use crate::domain::model::{SubmissionRequest, SubmissionResult};
use crate::domain::ports::{DocumentApi, SubmissionGateway};
use crate::utils::error::{ProtocolError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Parses a handler response body, tolerating bodies that are not JSON.
fn parse_result(text: &str) -> SubmissionResult {
    serde_json::from_str(text).unwrap_or_else(|_| {
        tracing::debug!("Handler returned a non-JSON body: {}", text);
        SubmissionResult::failed("Non-JSON response", None)
    })
}

fn check_result(status: u16, result: SubmissionResult) -> Result<SubmissionResult> {
    if (200..300).contains(&status) && result.success {
        Ok(result)
    } else {
        Err(failure_from_result(&result, Some(status)))
    }
}

/// Posts submissions to a remote handler endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: Client,
    endpoint: String,
}

impl HttpSubmissionGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResult> {
        tracing::debug!("Posting submission to: {}", self.endpoint);
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        tracing::debug!("Handler response status: {}", status);

        check_result(status, parse_result(&text))
    }
}

/// Runs the submission handler in the same process.
pub struct InProcessGateway<A: DocumentApi> {
    handler: SubmissionHandler<A>,
}

impl<A: DocumentApi> InProcessGateway<A> {
    pub fn new(handler: SubmissionHandler<A>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &SubmissionHandler<A> {
        &self.handler
    }
}

#[async_trait]
impl<A: DocumentApi> SubmissionGateway for InProcessGateway<A> {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResult> {
        let body = serde_json::to_string(request).map_err(ProtocolError::SerializationError)?;
        let response = self.handler.handle(HandlerRequest::post(body)).await;

        let result = serde_json::from_value(response.body)
            .unwrap_or_else(|_| SubmissionResult::failed("Non-JSON response", None));
        check_result(response.status, result)
    }
}
