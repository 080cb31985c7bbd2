//! Gemini-backed implementation of the shared `completion_provider` contract.
//!
//! This adapter bridges the async `gemini_api` transport into the blocking
//! `CompletionProvider`/`Transcriber` calls expected by `study_buddy`. Each call
//! is exactly one HTTP request; failures are flattened into messages.

use std::sync::Arc;
use std::time::Duration;

use completion_provider::{
    AudioClip, CompletionProvider, ProviderInitError, ProviderProfile, Transcriber,
};
use gemini_api::config::DEFAULT_GEMINI_MODEL;
use gemini_api::{GeminiApiClient, GeminiApiConfig, GeminiApiError, GenerateContentRequest};

/// Stable provider identifier used by `study_buddy` startup selection.
pub const GEMINI_PROVIDER_ID: &str = "gemini";

/// Instruction prepended to every completion prompt.
pub const DEFAULT_PREAMBLE: &str = "Answer concisely for students:\n";

const TRANSCRIBE_INSTRUCTION: &str =
    "Transcribe the speech in this audio verbatim. Reply with the transcript only, or with nothing if there is no speech.";

/// Runtime configuration for the Gemini provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub preamble: String,
}

impl GeminiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: None,
            timeout: None,
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    fn into_gemini_api_config(self) -> GeminiApiConfig {
        let mut config = GeminiApiConfig::new(self.api_key).with_model(self.model);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait GenerateClient: Send + Sync {
    fn generate_text(&self, request: &GenerateContentRequest) -> Result<String, GeminiApiError>;
}

#[derive(Debug)]
struct DefaultGenerateClient {
    client: GeminiApiClient,
}

impl GenerateClient for DefaultGenerateClient {
    fn generate_text(&self, request: &GenerateContentRequest) -> Result<String, GeminiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GeminiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.generate_text(request))
    }
}

/// `CompletionProvider` and `Transcriber` backed by `gemini_api` transport primitives.
pub struct GeminiProvider {
    model_id: String,
    preamble: String,
    client: Arc<dyn GenerateClient>,
}

impl GeminiProvider {
    /// Creates a provider using real Gemini transport.
    pub fn new(config: GeminiProviderConfig) -> Result<Self, ProviderInitError> {
        let model_id = config.model.trim().to_string();
        let preamble = config.preamble.clone();
        let client =
            GeminiApiClient::new(config.into_gemini_api_config()).map_err(map_init_error)?;

        tracing::debug!(
            model = %model_id,
            endpoint = %client.normalized_endpoint(),
            "gemini provider ready"
        );

        Ok(Self {
            model_id,
            preamble,
            client: Arc::new(DefaultGenerateClient { client }),
        })
    }

    #[cfg(test)]
    fn with_client_for_tests(
        model_id: &str,
        preamble: &str,
        client: Arc<dyn GenerateClient>,
    ) -> Self {
        Self {
            model_id: model_id.to_string(),
            preamble: preamble.to_string(),
            client,
        }
    }
}

impl CompletionProvider for GeminiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GEMINI_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn generate(&self, prompt: &str) -> Result<String, String> {
        let request = GenerateContentRequest::text(format!("{}{prompt}", self.preamble));
        self.client.generate_text(&request).map_err(|error| {
            tracing::warn!(%error, "gemini completion failed");
            format!("Gemini request failed: {error}")
        })
    }
}

impl Transcriber for GeminiProvider {
    fn transcribe(&self, clip: &AudioClip) -> Result<String, String> {
        if clip.is_empty() {
            return Ok(String::new());
        }

        let request =
            GenerateContentRequest::audio(TRANSCRIBE_INSTRUCTION, &clip.mime_type, &clip.bytes);
        match self.client.generate_text(&request) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(GeminiApiError::EmptyResponse) => Ok(String::new()),
            Err(error) => {
                tracing::warn!(%error, "gemini transcription failed");
                Err(format!("Gemini transcription failed: {error}"))
            }
        }
    }
}

fn map_init_error(error: GeminiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize gemini provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    struct FakeGenerateClient {
        observed: Mutex<Vec<GenerateContentRequest>>,
        outcome: Mutex<Option<Result<String, GeminiApiError>>>,
    }

    impl FakeGenerateClient {
        fn success(text: &str) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(Vec::new()),
                outcome: Mutex::new(Some(Ok(text.to_string()))),
            })
        }

        fn failure(error: GeminiApiError) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(Vec::new()),
                outcome: Mutex::new(Some(Err(error))),
            })
        }

        fn observed(&self) -> Vec<GenerateContentRequest> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    impl GenerateClient for FakeGenerateClient {
        fn generate_text(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<String, GeminiApiError> {
            lock_unpoisoned(&self.observed).push(request.clone());

            match lock_unpoisoned(&self.outcome).take() {
                Some(outcome) => outcome,
                None => panic!("fake outcome should be consumed exactly once"),
            }
        }
    }

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn first_text_part(request: &GenerateContentRequest) -> Option<String> {
        request.contents[0]
            .parts
            .iter()
            .find_map(|part| part.text.clone())
    }

    #[test]
    fn new_rejects_missing_api_key() {
        let error = match GeminiProvider::new(GeminiProviderConfig::new("  ")) {
            Ok(_) => panic!("blank key must fail"),
            Err(error) => error,
        };

        assert!(error.message().contains("API key is required"));
    }

    #[test]
    fn profile_reports_gemini_provider_and_model() {
        let provider = GeminiProvider::new(
            GeminiProviderConfig::new("key").with_model(" gemini-2.5-pro "),
        )
        .expect("provider");

        let profile = provider.profile();
        assert_eq!(profile.provider_id, GEMINI_PROVIDER_ID);
        assert_eq!(profile.model_id, "gemini-2.5-pro");
    }

    #[test]
    fn generate_prepends_preamble_and_returns_text() {
        let client = FakeGenerateClient::success("Plants make food from light.");
        let provider = GeminiProvider::with_client_for_tests(
            "gemini-2.5-flash",
            DEFAULT_PREAMBLE,
            Arc::clone(&client) as Arc<dyn GenerateClient>,
        );

        let text = provider
            .generate("Explain in simple words:\nphotosynthesis")
            .expect("generate");

        assert_eq!(text, "Plants make food from light.");
        let observed = client.observed();
        assert_eq!(observed.len(), 1);
        assert_eq!(
            first_text_part(&observed[0]).as_deref(),
            Some("Answer concisely for students:\nExplain in simple words:\nphotosynthesis")
        );
    }

    #[test]
    fn generate_flattens_transport_errors_into_messages() {
        let client = FakeGenerateClient::failure(GeminiApiError::Unknown("boom".to_string()));
        let provider = GeminiProvider::with_client_for_tests("m", "", client);

        let error = provider.generate("hi").expect_err("failure");
        assert_eq!(error, "Gemini request failed: boom");
    }

    #[test]
    fn transcribe_sends_inline_audio_and_trims_transcript() {
        let client = FakeGenerateClient::success("  what is osmosis \n");
        let provider = GeminiProvider::with_client_for_tests(
            "m",
            DEFAULT_PREAMBLE,
            Arc::clone(&client) as Arc<dyn GenerateClient>,
        );

        let text = provider
            .transcribe(&AudioClip::wav(b"RIFF....WAVE".to_vec()))
            .expect("transcribe");

        assert_eq!(text, "what is osmosis");
        let observed = client.observed();
        let parts = &observed[0].contents[0].parts;
        assert_eq!(
            parts[0].inline_data.as_ref().map(|data| data.mime_type.as_str()),
            Some("audio/wav")
        );
        assert_eq!(parts[1].text.as_deref(), Some(TRANSCRIBE_INSTRUCTION));
    }

    #[test]
    fn transcribe_treats_empty_clip_and_empty_response_as_silence() {
        let untouched = FakeGenerateClient::success("never used");
        let provider = GeminiProvider::with_client_for_tests(
            "m",
            "",
            Arc::clone(&untouched) as Arc<dyn GenerateClient>,
        );
        assert_eq!(provider.transcribe(&AudioClip::wav(Vec::new())), Ok(String::new()));
        assert!(untouched.observed().is_empty());

        let silent = FakeGenerateClient::failure(GeminiApiError::EmptyResponse);
        let provider = GeminiProvider::with_client_for_tests("m", "", silent);
        assert_eq!(provider.transcribe(&AudioClip::wav(vec![1])), Ok(String::new()));
    }
}
