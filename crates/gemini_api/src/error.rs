use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum GeminiApiError {
    MissingApiKey,
    MissingModel,
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    Blocked(String),
    EmptyResponse,
    Unknown(String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    pub status: Option<String>,
}

impl ErrorPayloadFields {
    pub fn quota_message(&self, status: StatusCode) -> Option<String> {
        let code = self.status.as_deref().and_then(non_empty_string).unwrap_or("");
        if !matches_quota(code, status) {
            return None;
        }

        let detail = self
            .message
            .as_deref()
            .and_then(non_empty_string)
            .map(|message| format!(" {message}"))
            .unwrap_or_default();
        Some(format!("Gemini quota exhausted.{detail}").trim().to_string())
    }

    pub fn message_or_fallback(&self) -> Option<String> {
        let explicit = self.message.as_deref().and_then(non_empty_string)?;
        Some(explicit.to_owned())
    }
}

impl fmt::Display for GeminiApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::MissingModel => write!(f, "model id is required"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "malformed response: {error}"),
            Self::Blocked(reason) => write!(f, "response blocked by provider ({reason})"),
            Self::EmptyResponse => write!(f, "provider returned no candidates"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for GeminiApiError {}

impl From<reqwest::Error> for GeminiApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for GeminiApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts a human-readable message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let parsed = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload,
        Err(_) => return raw_or_reason(status, body),
    };

    if let Some(error) = parsed.value {
        if let Some(message) = error.quota_message(status) {
            return message;
        }
        if let Some(message) = error.message_or_fallback() {
            return message;
        }
    }

    raw_or_reason(status, body)
}

fn raw_or_reason(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

fn matches_quota(code: &str, status: StatusCode) -> bool {
    matches!(status, StatusCode::TOO_MANY_REQUESTS)
        || code.eq_ignore_ascii_case("RESOURCE_EXHAUSTED")
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
