use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::GeminiApiError;

/// Canonical request payload shape for the `generateContent` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Single user turn carrying `prompt` verbatim.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            system_instruction: None,
            generation_config: Some(GenerationConfig::single_candidate()),
        }
    }

    /// Single user turn carrying an inline audio clip followed by `instruction`.
    pub fn audio(
        instruction: impl Into<String>,
        mime_type: impl Into<String>,
        audio: &[u8],
    ) -> Self {
        Self {
            contents: vec![Content::user(vec![
                Part::inline(mime_type, audio),
                Part::text(instruction),
            ])],
            system_instruction: None,
            generation_config: Some(GenerationConfig::single_candidate()),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: vec![Part::text(instruction)],
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on reasoning parts, which never belong in the answer text.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: general_purpose::STANDARD.encode(bytes),
            }),
            ..Self::default()
        }
    }
}

/// Base64 encoded media embedded in a request part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl GenerationConfig {
    pub fn single_candidate() -> Self {
        Self {
            candidate_count: Some(1),
            temperature: None,
        }
    }
}

/// Response body of a successful `generateContent` call.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Returns the text of the first candidate, its non-thought parts joined in order.
    ///
    /// A blocked prompt or a candidate stopped for safety without any text is an error;
    /// so is a response without candidates.
    pub fn first_text(&self) -> Result<String, GeminiApiError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Err(GeminiApiError::Blocked(reason.to_string()));
        }

        let Some(candidate) = self.candidates.first() else {
            return Err(GeminiApiError::EmptyResponse);
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter(|part| !part.thought)
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                    Err(GeminiApiError::Blocked(reason.to_string()))
                }
                _ => Err(GeminiApiError::EmptyResponse),
            };
        }

        Ok(text)
    }
}
