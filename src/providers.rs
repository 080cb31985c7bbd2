use std::sync::Arc;

use completion_provider::{CompletionProvider, Transcriber};
use completion_provider_gemini::GeminiProvider;
use completion_provider_mock::{MockProvider, MockTranscriber};

use crate::completion::CompletionClient;
use crate::config::{LoadedConfig, ProviderKind};
use crate::pipeline::Pipeline;

/// Builds the pipeline for the loaded configuration. Any configuration or
/// provider initialization problem yields a disabled client, never an error.
pub fn pipeline_from_config(loaded: &LoadedConfig) -> Pipeline {
    if let Some(error) = &loaded.error {
        return Pipeline::new(CompletionClient::disabled(error.to_string()), None);
    }

    match loaded.config.provider {
        ProviderKind::Mock => {
            let provider: Arc<dyn CompletionProvider> = Arc::new(MockProvider::default());
            let transcriber: Arc<dyn Transcriber> = Arc::new(MockTranscriber::default());
            log_ready(&provider);
            Pipeline::new(CompletionClient::new(provider), Some(transcriber))
        }
        ProviderKind::Gemini => {
            let Some(config) = loaded.config.gemini.provider_config() else {
                return Pipeline::new(
                    CompletionClient::disabled("gemini.api_key is not configured"),
                    None,
                );
            };

            match GeminiProvider::new(config) {
                Ok(provider) => {
                    let provider = Arc::new(provider);
                    let completion: Arc<dyn CompletionProvider> = provider.clone();
                    let transcriber: Arc<dyn Transcriber> = provider;
                    log_ready(&completion);
                    Pipeline::new(CompletionClient::new(completion), Some(transcriber))
                }
                Err(error) => {
                    tracing::error!(%error, "provider initialization failed");
                    Pipeline::new(CompletionClient::disabled(error.message()), None)
                }
            }
        }
    }
}

fn log_ready(provider: &Arc<dyn CompletionProvider>) {
    let profile = provider.profile();
    tracing::info!(
        provider = %profile.provider_id,
        model = %profile.model_id,
        "completion provider ready"
    );
}
