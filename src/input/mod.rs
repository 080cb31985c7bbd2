//! Input normalization: typed text, uploads and audio all become one plain-text string.
//!
//! Nothing here fails. A file that cannot be read yields empty text with the
//! reason attached, and the pipeline decides what to do with it.

pub mod pdf;
pub mod slides;

use std::fs;
use std::io;
use std::path::Path;

use completion_provider::{AudioClip, Transcriber};
use thiserror::Error;

use crate::input::pdf::{first_pages_text, LopdfPages};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {file_name}")]
    Unsupported { file_name: String },

    #[error("could not read PDF {file_name}: {reason}")]
    Pdf { file_name: String, reason: String },

    #[error("{file_name} is not valid UTF-8 text")]
    Encoding { file_name: String },

    #[error("could not read slide deck {file_name}: {reason}")]
    SlideDeck { file_name: String, reason: String },

    #[error("could not transcribe {file_name}: {reason}")]
    Transcription { file_name: String, reason: String },

    #[error("speech-to-text is not available")]
    TranscriberUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    PlainText,
    SlideDeck,
    Audio,
}

impl UploadKind {
    /// Chosen by extension, case-insensitively.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "pptx" => Some(Self::SlideDeck),
            "wav" => Some(Self::Audio),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "text",
            Self::SlideDeck => "slides",
            Self::Audio => "audio",
        }
    }
}

/// A file the user attached, read fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }

    #[must_use]
    pub fn kind(&self) -> Option<UploadKind> {
        UploadKind::from_file_name(&self.file_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedInput {
    pub text: String,
    /// Why an upload produced no text, when it did not.
    pub degraded: Option<ExtractionError>,
}

impl NormalizedInput {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: None,
        }
    }

    fn degraded(error: ExtractionError) -> Self {
        tracing::warn!(%error, "input extraction degraded to empty text");
        Self {
            text: String::new(),
            degraded: Some(error),
        }
    }

    /// Whitespace-only text counts as no input.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Typed text plus an optional upload. A readable document upload wins over
/// the text box; an unsupported one is ignored in favour of the typed text.
pub fn normalize_document(text: &str, upload: Option<&Upload>) -> NormalizedInput {
    let Some(upload) = upload else {
        return NormalizedInput::text(text);
    };

    match upload.kind() {
        Some(UploadKind::Pdf) => extract_pdf(upload),
        Some(UploadKind::PlainText) => decode_plain_text(upload),
        Some(UploadKind::SlideDeck) => extract_slides(upload),
        Some(UploadKind::Audio) | None => {
            let error = ExtractionError::Unsupported {
                file_name: upload.file_name.clone(),
            };
            tracing::warn!(%error, "ignoring upload");
            NormalizedInput {
                text: text.to_string(),
                degraded: Some(error),
            }
        }
    }
}

/// Transcribes an audio upload. Any failure degrades to empty text.
pub fn normalize_audio(upload: &Upload, transcriber: Option<&dyn Transcriber>) -> NormalizedInput {
    if upload.kind() != Some(UploadKind::Audio) {
        return NormalizedInput::degraded(ExtractionError::Unsupported {
            file_name: upload.file_name.clone(),
        });
    }
    let Some(transcriber) = transcriber else {
        return NormalizedInput::degraded(ExtractionError::TranscriberUnavailable);
    };

    match transcriber.transcribe(&AudioClip::wav(upload.bytes.clone())) {
        Ok(text) => NormalizedInput::text(text),
        Err(reason) => NormalizedInput::degraded(ExtractionError::Transcription {
            file_name: upload.file_name.clone(),
            reason,
        }),
    }
}

fn extract_pdf(upload: &Upload) -> NormalizedInput {
    match LopdfPages::load(&upload.bytes) {
        Ok(pages) => NormalizedInput::text(first_pages_text(&pages)),
        Err(error) => NormalizedInput::degraded(ExtractionError::Pdf {
            file_name: upload.file_name.clone(),
            reason: error,
        }),
    }
}

fn decode_plain_text(upload: &Upload) -> NormalizedInput {
    match String::from_utf8(upload.bytes.clone()) {
        Ok(text) => NormalizedInput::text(text),
        Err(_) => NormalizedInput::degraded(ExtractionError::Encoding {
            file_name: upload.file_name.clone(),
        }),
    }
}

fn extract_slides(upload: &Upload) -> NormalizedInput {
    match slides::extract_text(&upload.bytes) {
        Ok(text) => NormalizedInput::text(text),
        Err(reason) => NormalizedInput::degraded(ExtractionError::SlideDeck {
            file_name: upload.file_name.clone(),
            reason,
        }),
    }
}
