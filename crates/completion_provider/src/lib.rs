//! Minimal provider-agnostic contract for one-shot text completion and speech
//! transcription.
//!
//! This crate intentionally defines only the call contract shared by the study
//! pipeline and its providers. It excludes provider transport details, prompt
//! templates, and any session bookkeeping.

use std::fmt;

/// Error returned while constructing/configuring a provider before any call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Audio payload read fully into memory from an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    /// Wraps a RIFF/WAVE upload.
    #[must_use]
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".to_string(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Provider interface for a single blocking text completion.
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Sends `prompt` and returns the provider's single best completion.
    ///
    /// Implementations never retry; every transport, auth, quota or decoding
    /// failure is reported as `Err(message)`.
    fn generate(&self, prompt: &str) -> Result<String, String>;
}

/// Speech-to-text interface for uploaded audio.
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribes one clip. Silence may yield an empty string.
    fn transcribe(&self, clip: &AudioClip) -> Result<String, String>;
}
