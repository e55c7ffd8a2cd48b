use crate::config::env::HandlerEnv;
use crate::domain::ports::DocumentApi;
use crate::utils::error::{ProtocolError, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const DEFAULT_SYSTEM_NAME: &str = "Coffee System";

const REQUIRED_FIELDS: [&str; 2] = ["mode", "answers"];

/// Request as seen at the function boundary.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: String,
    pub body: Option<String>,
}

impl HandlerRequest {
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

/// Serverless event shape (`httpMethod` plus a raw string body).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl From<FunctionEvent> for HandlerRequest {
    fn from(event: FunctionEvent) -> Self {
        Self {
            method: event.http_method,
            body: event.body,
        }
    }
}

impl From<HandlerResponse> for FunctionResponse {
    fn from(response: HandlerResponse) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code: response.status,
            headers,
            body: response.body.to_string(),
        }
    }
}

/// Payload fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub mode: String,
    pub answers: Map<String, Value>,
    pub system_name: Option<String>,
    pub timestamp: Option<String>,
}

/// Checks the parsed body for a category tag and an answer mapping.
pub fn validate_payload(payload: &Value) -> Result<ValidatedSubmission> {
    let object = payload.as_object();
    let field = |name: &str| object.and_then(|o| o.get(name));

    let mode = field("mode")
        .and_then(Value::as_str)
        .filter(|mode| !mode.trim().is_empty());
    let answers = field("answers").and_then(Value::as_object);

    match (mode, answers) {
        (Some(mode), Some(answers)) => {
            let optional_string = |name: &str| {
                field(name)
                    .and_then(Value::as_str)
                    .filter(|value| !value.trim().is_empty())
                    .map(str::to_string)
            };
            Ok(ValidatedSubmission {
                mode: mode.to_string(),
                answers: answers.clone(),
                system_name: optional_string("systemName"),
                timestamp: optional_string("timestamp"),
            })
        }
        (mode, answers) => {
            let mut missing = Vec::new();
            if mode.is_none() {
                missing.push(REQUIRED_FIELDS[0].to_string());
            }
            if answers.is_none() {
                missing.push(REQUIRED_FIELDS[1].to_string());
            }
            // 只回傳欄位名稱，不回傳內容
            let received = object
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            Err(ProtocolError::ValidationFailed { missing, received })
        }
    }
}

/// `"<parameter>: <value>"`, with non-string values rendered as compact JSON.
pub fn answer_line(parameter: &str, value: &Value) -> String {
    match value {
        Value::String(text) => format!("{}: {}", parameter, text),
        other => format!("{}: {}", parameter, other),
    }
}

/// Maps a submission onto the database schema: `Name` title, `Mode` select,
/// `Created` date, and one paragraph block per answer.
pub fn build_page(database_id: &str, submission: &ValidatedSubmission) -> Value {
    let name = submission
        .system_name
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_NAME);
    let created = submission
        .timestamp
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let children: Vec<Value> = submission
        .answers
        .iter()
        .map(|(parameter, value)| {
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [
                        { "type": "text", "text": { "content": answer_line(parameter, value) } }
                    ]
                }
            })
        })
        .collect();

    json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": { "title": [ { "text": { "content": name } } ] },
            "Mode": { "select": { "name": submission.mode } },
            "Created": { "date": { "start": created } }
        },
        "children": children
    })
}

/// Structured JSON body for a failed request. Never includes credentials.
pub fn error_body(error: &ProtocolError) -> Value {
    match error {
        ProtocolError::MethodNotAllowed { .. } => {
            json!({ "success": false, "error": "Method not allowed" })
        }
        ProtocolError::MalformedInput { .. } => {
            json!({ "success": false, "error": "Invalid JSON body" })
        }
        ProtocolError::ValidationFailed { missing, received } => json!({
            "success": false,
            "error": "Missing required fields",
            "details": { "missing": missing, "received": received }
        }),
        ProtocolError::Misconfigured { message, missing } => json!({
            "success": false,
            "error": message,
            "details": { "missing": missing }
        }),
        ProtocolError::UpstreamFailure {
            status,
            code,
            message,
            ..
        } => {
            let mut details = Map::new();
            if let Some(status) = status {
                details.insert("status".to_string(), json!(status));
            }
            if let Some(code) = code {
                details.insert("code".to_string(), json!(code));
            }
            details.insert("message".to_string(), json!(message));

            let mut body = details.clone();
            body.insert("success".to_string(), json!(false));
            body.insert("error".to_string(), json!("Internal server error"));
            body.insert("details".to_string(), Value::Object(details));
            Value::Object(body)
        }
        other => json!({
            "success": false,
            "error": "Internal server error",
            "message": other.to_string(),
            "details": { "message": other.to_string() }
        }),
    }
}

/// Validates submissions and forwards each valid one to the document API.
pub struct SubmissionHandler<A: DocumentApi> {
    api: A,
    env: HandlerEnv,
}

impl<A: DocumentApi> SubmissionHandler<A> {
    pub fn new(api: A, env: HandlerEnv) -> Self {
        Self { api, env }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        match self.process(request).await {
            Ok(document_url) => HandlerResponse {
                status: 200,
                body: json!({ "success": true, "documentUrl": document_url }),
            },
            Err(e) => {
                if e.status_code() >= 500 {
                    tracing::error!("❌ Submission handler error: {} ({:?})", e, e.kind());
                } else {
                    tracing::warn!("⚠️ Rejected submission: {} ({:?})", e, e.kind());
                }
                HandlerResponse {
                    status: e.status_code(),
                    body: error_body(&e),
                }
            }
        }
    }

    async fn process(&self, request: HandlerRequest) -> Result<String> {
        if !request.method.eq_ignore_ascii_case("POST") {
            return Err(ProtocolError::MethodNotAllowed {
                method: request.method,
            });
        }

        let payload: Value = serde_json::from_str(request.body.as_deref().unwrap_or(""))
            .map_err(|e| ProtocolError::MalformedInput {
                message: e.to_string(),
            })?;

        let submission = validate_payload(&payload)?;
        let credentials = self.env.credentials()?;

        let page = build_page(credentials.database_id, &submission);
        tracing::info!(
            "📝 Creating page '{}' ({}, {} answers)",
            submission.system_name.as_deref().unwrap_or(DEFAULT_SYSTEM_NAME),
            submission.mode,
            submission.answers.len()
        );

        let url = self.api.create_page(credentials.token, &page).await?;
        tracing::info!("✅ Page created: {}", url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_payload_reports_missing_fields_by_name() {
        let payload = json!({"answers": "alertness", "systemName": "secret-ish"});
        let err = validate_payload(&payload).unwrap_err();

        match err {
            ProtocolError::ValidationFailed { missing, received } => {
                assert_eq!(missing, vec!["mode".to_string(), "answers".to_string()]);
                assert_eq!(received, vec!["answers".to_string(), "systemName".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_payload_rejects_non_object_body() {
        let err = validate_payload(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ProtocolError::ValidationFailed { ref received, .. } if received.is_empty()));
    }

    #[test]
    fn test_build_page_uses_defaults_and_keeps_order() {
        let submission = validate_payload(&json!({
            "mode": "ritual",
            "answers": {"Core Purpose": "agency", "Temporal Resolution": "weekly", "Count": 3}
        }))
        .unwrap();

        let page = build_page("db-123", &submission);

        assert_eq!(page["parent"]["database_id"], "db-123");
        assert_eq!(page["properties"]["Name"]["title"][0]["text"]["content"], DEFAULT_SYSTEM_NAME);
        assert_eq!(page["properties"]["Mode"]["select"]["name"], "ritual");
        assert!(page["properties"]["Created"]["date"]["start"].as_str().unwrap().ends_with('Z'));

        let lines: Vec<&str> = page["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|block| block["paragraph"]["rich_text"][0]["text"]["content"].as_str().unwrap())
            .collect();
        assert_eq!(lines, vec!["Core Purpose: agency", "Temporal Resolution: weekly", "Count: 3"]);
    }

    #[test]
    fn test_upstream_error_body_omits_unknown_fields() {
        let body = error_body(&ProtocolError::UpstreamFailure {
            status: None,
            code: None,
            message: "connection reset".to_string(),
            details: None,
        });
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "connection reset");
        assert!(body.get("status").is_none());
        assert!(body.get("code").is_none());
    }

    #[test]
    fn test_function_response_is_json() {
        let response: FunctionResponse = HandlerResponse {
            status: 405,
            body: json!({"success": false, "error": "Method not allowed"}),
        }
        .into();

        assert_eq!(response.status_code, 405);
        assert_eq!(response.headers["Content-Type"], "application/json");
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    #[test]
    fn test_mode_is_forwarded_verbatim() {
        let submission = validate_payload(&json!({"mode": " Ritual ", "answers": {}})).unwrap();
        assert_eq!(submission.mode, " Ritual ");

        let err = validate_payload(&json!({"mode": "   ", "answers": {}})).unwrap_err();
        assert!(matches!(err, ProtocolError::ValidationFailed { ref missing, .. } if missing == &vec!["mode".to_string()]));
    }
}
