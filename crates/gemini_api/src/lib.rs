//! Transport-only client primitives for the hosted Gemini `generateContent`
//! endpoint.
//!
//! This crate owns request building, header construction and response/error
//! parsing only. It contains no prompt templates, no retry policy and no
//! coupling to the study pipeline; one call is one HTTP request.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::GeminiApiClient;
pub use config::GeminiApiConfig;
pub use error::GeminiApiError;
pub use payload::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part, PromptFeedback,
};
pub use url::normalize_generate_url;
