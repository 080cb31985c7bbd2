use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::GeminiApiConfig;
use crate::error::{parse_error_message, GeminiApiError};
use crate::headers::build_headers;
use crate::payload::{GenerateContentRequest, GenerateContentResponse};
use crate::url::normalize_generate_url;

#[derive(Debug)]
pub struct GeminiApiClient {
    http: Client,
    config: GeminiApiConfig,
}

impl GeminiApiClient {
    /// Validates `config` and builds the underlying HTTP client.
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }
        if config.model.trim().is_empty() {
            return Err(GeminiApiError::MissingModel);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GeminiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_generate_url(&self.config.base_url, &self.config.model)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, GeminiApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| GeminiApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    GeminiApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::RequestBuilder, GeminiApiError> {
        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Sends one request. Non-success statuses are mapped to [`GeminiApiError::Status`]
    /// with the provider's message; nothing is retried.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GeminiApiError::Status(
                status,
                parse_error_message(status, &body),
            ));
        }

        serde_json::from_str::<GenerateContentResponse>(&body).map_err(GeminiApiError::from)
    }

    /// Sends one request and returns the first candidate's text.
    pub async fn generate_text(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<String, GeminiApiError> {
        self.generate(request).await?.first_text()
    }
}
