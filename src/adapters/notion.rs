use crate::config::env::HandlerEnv;
use crate::domain::ports::DocumentApi;
use crate::utils::error::{ProtocolError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const NOTION_VERSION: &str = "2022-06-28";

/// Error object returned by the Notion API.
#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    status: Option<u16>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl NotionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 0,
            retry_delay: Duration::from_millis(0),
        })
    }

    pub fn from_env(env: &HandlerEnv) -> Result<Self> {
        Ok(Self::new(env.api_base.clone(), env.timeout())?.with_retries(env.max_retries, env.retry_delay()))
    }

    /// Extra attempts for transient failures (5xx or transport errors). 4xx is never retried.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn pages_url(&self) -> String {
        format!("{}/v1/pages", self.base_url)
    }

    async fn create_once(&self, token: &str, page: &Value) -> Result<String> {
        let response = self
            .client
            .post(self.pages_url())
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(page)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Notion response status: {}", status);
        let text = response.text().await?;

        if !status.is_success() {
            return Err(upstream_error(status, &text));
        }

        let created: CreatedPage = serde_json::from_str(&text)?;
        created.url.ok_or_else(|| ProtocolError::UpstreamFailure {
            status: Some(status.as_u16()),
            code: None,
            message: "Notion response did not include a page URL".to_string(),
            details: None,
        })
    }
}

fn upstream_error(status: StatusCode, text: &str) -> ProtocolError {
    let body: Option<NotionErrorBody> = serde_json::from_str(text).ok();
    let (reported_status, code, message) = match body {
        Some(body) => (body.status, body.code, body.message),
        None => (None, None, None),
    };

    ProtocolError::UpstreamFailure {
        status: Some(reported_status.unwrap_or_else(|| status.as_u16())),
        code,
        message: message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown upstream error")
                .to_string()
        }),
        details: None,
    }
}

fn is_transient(error: &ProtocolError) -> bool {
    match error {
        ProtocolError::NetworkFailure(_) => true,
        ProtocolError::UpstreamFailure {
            status: Some(status),
            ..
        } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl DocumentApi for NotionClient {
    async fn create_page(&self, token: &str, page: &Value) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.create_once(token, page).await {
                Ok(url) => return Ok(url),
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ Notion request failed ({}), retry {}/{}",
                        e,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
