//! Deterministic mock implementation of the shared `completion_provider` contract.
//!
//! This crate contains no transport logic and is intended for local development
//! and contract-level tests. Every call is counted and every prompt captured so
//! tests can assert that a code path never reached the provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use completion_provider::{AudioClip, CompletionProvider, ProviderProfile, Transcriber};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// One scripted provider outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Text(String),
    Failure(String),
}

impl ScriptedReply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    fn into_result(self) -> Result<String, String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Failure(message) => Err(message),
        }
    }
}

/// Deterministic mock provider used by `study_buddy` tests and local runs.
#[derive(Debug)]
pub struct MockProvider {
    script: Mutex<VecDeque<ScriptedReply>>,
    fallback: ScriptedReply,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl MockProvider {
    /// Creates a provider that answers every prompt with `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self::with_script(Vec::new(), ScriptedReply::text(reply))
    }

    /// Creates a provider whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Vec::new(), ScriptedReply::failure(message))
    }

    /// Creates a provider that plays `script` in order, then answers with `fallback`.
    #[must_use]
    pub fn with_script(script: Vec<ScriptedReply>, fallback: ScriptedReply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Adds an artificial delay before every reply.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of `generate` calls observed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        lock_unpoisoned(&self.prompts).clone()
    }

    const LOCAL_RUN_LATENCY_MS: u64 = 600;
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(concat!(
            "## Mocked study answer\n",
            "- **Key idea**: break the topic into small, testable pieces.\n",
            "- **Example**: photosynthesis turns light, water and CO2 into glucose and oxygen.\n",
            "- **Check yourself**: explain it aloud in under a minute.\n",
            "\n",
            "Keep going, consistency beats cramming.\n",
        ))
        .with_latency(Duration::from_millis(Self::LOCAL_RUN_LATENCY_MS))
    }
}

impl CompletionProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn generate(&self, prompt: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock_unpoisoned(&self.prompts).push(prompt.to_string());

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        let scripted = lock_unpoisoned(&self.script).pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone()).into_result()
    }
}

/// Deterministic speech-to-text double.
#[derive(Debug)]
pub struct MockTranscriber {
    outcome: ScriptedReply,
    calls: AtomicUsize,
}

impl MockTranscriber {
    /// Creates a transcriber that returns `transcript` for every clip.
    #[must_use]
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            outcome: ScriptedReply::text(transcript),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a transcriber that fails every clip with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: ScriptedReply::failure(message),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new("What is the difference between mitosis and meiosis?")
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _clip: &AudioClip) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().into_result()
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockProvider::new("ok").profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, "mock");
    }

    #[test]
    fn generate_counts_calls_and_captures_prompts() {
        let provider = MockProvider::new("answer");

        assert_eq!(provider.call_count(), 0);
        assert_eq!(provider.generate("first").as_deref(), Ok("answer"));
        assert_eq!(provider.generate("second").as_deref(), Ok("answer"));

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn script_plays_in_order_then_falls_back() {
        let provider = MockProvider::with_script(
            vec![
                ScriptedReply::text("one"),
                ScriptedReply::failure("provider timeout"),
            ],
            ScriptedReply::text("fallback"),
        );

        assert_eq!(provider.generate("a"), Ok("one".to_string()));
        assert_eq!(provider.generate("b"), Err("provider timeout".to_string()));
        assert_eq!(provider.generate("c"), Ok("fallback".to_string()));
        assert_eq!(provider.generate("d"), Ok("fallback".to_string()));
    }

    #[test]
    fn failing_provider_reports_message_on_every_call() {
        let provider = MockProvider::failing("quota exceeded");

        assert_eq!(provider.generate("x"), Err("quota exceeded".to_string()));
        assert_eq!(provider.generate("y"), Err("quota exceeded".to_string()));
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn transcriber_counts_calls() {
        let transcriber = MockTranscriber::new("hello there");
        let clip = AudioClip::wav(vec![0; 4]);

        assert_eq!(transcriber.transcribe(&clip), Ok("hello there".to_string()));
        assert_eq!(transcriber.call_count(), 1);

        let failing = MockTranscriber::failing("could not understand audio");
        assert!(failing.transcribe(&clip).is_err());
    }
}
