//! Completion client: one blocking provider call per request, never an error.

use std::sync::Arc;

use completion_provider::{CompletionProvider, ProviderProfile};

use crate::prompt::CompletionRequest;

/// Reason reported by a client that has no provider.
pub const MODEL_NOT_INITIALIZED: &str = "model not initialized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success(String),
    Failure(String),
}

impl CompletionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The answer on success, the reason on failure.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }
}

pub struct CompletionClient {
    provider: Option<Arc<dyn CompletionProvider>>,
    disabled_reason: Option<String>,
}

impl CompletionClient {
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider: Some(provider),
            disabled_reason: None,
        }
    }

    /// A client that answers every request with [`MODEL_NOT_INITIALIZED`].
    #[must_use]
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            provider: None,
            disabled_reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Why the client is disabled, for the startup banner.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    #[must_use]
    pub fn profile(&self) -> Option<ProviderProfile> {
        self.provider.as_ref().map(|provider| provider.profile())
    }

    /// Sends the composed prompt once. No retry; provider errors become `Failure`.
    pub fn complete(&self, request: CompletionRequest) -> CompletionResult {
        let Some(provider) = self.provider.as_ref() else {
            return CompletionResult::Failure(MODEL_NOT_INITIALIZED.to_string());
        };

        match provider.generate(&request.prompt()) {
            Ok(text) => CompletionResult::Success(text),
            Err(message) => {
                tracing::warn!(
                    provider = %provider.profile().provider_id,
                    %message,
                    "completion failed"
                );
                CompletionResult::Failure(message)
            }
        }
    }
}
