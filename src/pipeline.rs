//! Normalize, compose, complete, record.
//!
//! One call of [`Pipeline::run`] handles one user action to completion. The
//! session log is only touched after a successful completion, and the provider
//! is never called for empty input.

use std::sync::Arc;

use completion_provider::Transcriber;
use session_log::SessionState;
use thiserror::Error;
use time::macros::format_description;
use time::Date;

use crate::completion::{CompletionClient, CompletionResult};
use crate::concept_map::ConceptMap;
use crate::features::{self, Feature, InputShape, RenderMode};
use crate::input::{self, ExtractionError, NormalizedInput, Upload};
use crate::prompt::{compose, CompletionRequest};

pub const MIN_STUDY_HOURS: u8 = 1;
pub const MAX_STUDY_HOURS: u8 = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("{feature} expects {expected} input")]
    WrongInputShape {
        feature: &'static str,
        expected: InputShape,
    },

    #[error("please provide some input first")]
    InputMissing {
        #[source]
        cause: Option<ExtractionError>,
    },

    #[error("invalid study plan: {0}")]
    InvalidPlanner(String),
}

/// Study planner form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerRequest {
    pub subject: String,
    pub hours_per_day: u8,
    pub exam_date: Date,
}

impl PlannerRequest {
    pub fn new(
        subject: impl Into<String>,
        hours_per_day: u8,
        exam_date: Date,
    ) -> Result<Self, PipelineError> {
        if !(MIN_STUDY_HOURS..=MAX_STUDY_HOURS).contains(&hours_per_day) {
            return Err(PipelineError::InvalidPlanner(format!(
                "hours per day must be between {MIN_STUDY_HOURS} and {MAX_STUDY_HOURS}, got {hours_per_day}"
            )));
        }
        Ok(Self {
            subject: subject.into(),
            hours_per_day,
            exam_date,
        })
    }

    /// Parses the shell's `subject | hours | YYYY-MM-DD` fields.
    pub fn parse(subject: &str, hours: &str, exam_date: &str) -> Result<Self, PipelineError> {
        let hours_per_day = hours.trim().parse::<u8>().map_err(|_| {
            PipelineError::InvalidPlanner(format!("'{}' is not a number of hours", hours.trim()))
        })?;
        let exam_date = Date::parse(exam_date.trim(), format_description!("[year]-[month]-[day]"))
            .map_err(|error| {
                PipelineError::InvalidPlanner(format!(
                    "'{}' is not a YYYY-MM-DD date: {error}",
                    exam_date.trim()
                ))
            })?;
        Self::new(subject.trim(), hours_per_day, exam_date)
    }

    /// Completes the planner template into one sentence.
    #[must_use]
    pub fn body(&self) -> String {
        if self.subject.trim().is_empty() {
            return String::new();
        }
        format!(
            "{} with {} hours until {}.",
            self.subject, self.hours_per_day, self.exam_date
        )
    }
}

/// User input for one feature, shaped by [`Feature::input_shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureInput {
    Document { text: String, upload: Option<Upload> },
    Topic(String),
    Planner(PlannerRequest),
    Audio(Upload),
}

impl FeatureInput {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Document {
            text: text.into(),
            upload: None,
        }
    }

    fn shape(&self) -> InputShape {
        match self {
            Self::Document { .. } => InputShape::Document,
            Self::Topic(_) => InputShape::Topic,
            Self::Planner(_) => InputShape::Planner,
            Self::Audio(_) => InputShape::Audio,
        }
    }
}

/// What one run produced. `result` is either the answer or the provider's reason.
#[derive(Debug)]
pub struct Completed {
    pub feature: &'static Feature,
    pub input_text: String,
    pub result: CompletionResult,
    /// Set for diagram features after a successful completion.
    pub concept_map: Option<ConceptMap>,
    /// An upload that was ignored while typed text was used instead.
    pub ignored_upload: Option<ExtractionError>,
}

pub struct Pipeline {
    client: CompletionClient,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(client: CompletionClient, transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            client,
            transcriber,
        }
    }

    #[must_use]
    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Normalizes `input` and composes the request, without any provider call.
    pub fn prepare(
        &self,
        feature: &'static Feature,
        input: &FeatureInput,
    ) -> Result<(NormalizedInput, CompletionRequest), PipelineError> {
        if input.shape() != feature.input_shape {
            return Err(PipelineError::WrongInputShape {
                feature: feature.id,
                expected: feature.input_shape,
            });
        }

        let normalized = self.normalize(input);
        if normalized.is_missing() {
            return Err(PipelineError::InputMissing {
                cause: normalized.degraded,
            });
        }

        let request = compose(feature.template, &normalized.text);
        Ok((normalized, request))
    }

    /// Runs `feature_id` end to end and records a success in `session`.
    pub fn run(
        &self,
        session: &mut SessionState,
        feature_id: &str,
        input: FeatureInput,
    ) -> Result<Completed, PipelineError> {
        let feature = features::lookup(feature_id)
            .ok_or_else(|| PipelineError::UnknownFeature(feature_id.trim().to_string()))?;

        let (normalized, request) = match self.prepare(feature, &input) {
            Ok(prepared) => prepared,
            Err(error) => {
                tracing::info!(feature = feature.id, %error, "pipeline stopped before completion");
                return Err(error);
            }
        };

        let result = self.client.complete(request);
        tracing::info!(
            feature = feature.id,
            input_len = normalized.text.len(),
            success = result.is_success(),
            "pipeline run finished"
        );

        let concept_map = match (&result, feature.render_mode) {
            (CompletionResult::Success(answer), RenderMode::Diagram) => {
                Some(ConceptMap::from_answer(&normalized.text, answer))
            }
            _ => None,
        };

        if let CompletionResult::Success(answer) = &result {
            session
                .log
                .append(feature.title, normalized.text.clone(), answer.clone());
        }

        Ok(Completed {
            feature,
            input_text: normalized.text,
            result,
            concept_map,
            ignored_upload: normalized.degraded,
        })
    }

    fn normalize(&self, input: &FeatureInput) -> NormalizedInput {
        match input {
            FeatureInput::Document { text, upload } => {
                input::normalize_document(text, upload.as_ref())
            }
            FeatureInput::Topic(topic) => NormalizedInput::text(topic.clone()),
            FeatureInput::Planner(request) => NormalizedInput::text(request.body()),
            FeatureInput::Audio(upload) => {
                input::normalize_audio(upload, self.transcriber.as_deref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn exam_date() -> Date {
        Date::from_calendar_date(2026, Month::December, 1).expect("valid date")
    }

    #[test]
    fn planner_body_completes_the_template_sentence() {
        let request = PlannerRequest::new("Physics", 3, exam_date()).expect("planner");

        assert_eq!(
            format!("{}{}", features::PLANNER_TEMPLATE, request.body()),
            "Create a daily study plan for Physics with 3 hours until 2026-12-01."
        );
    }

    #[test]
    fn planner_hours_are_bounded() {
        assert!(PlannerRequest::new("Math", 0, exam_date()).is_err());
        assert!(PlannerRequest::new("Math", 11, exam_date()).is_err());
        assert!(PlannerRequest::new("Math", 1, exam_date()).is_ok());
        assert!(PlannerRequest::new("Math", 10, exam_date()).is_ok());
    }

    #[test]
    fn planner_fields_are_parsed() {
        let request = PlannerRequest::parse(" Chemistry ", " 4 ", "2026-12-01").expect("parse");

        assert_eq!(request.subject, "Chemistry");
        assert_eq!(request.hours_per_day, 4);
        assert_eq!(request.exam_date, exam_date());
        assert!(matches!(
            PlannerRequest::parse("Chemistry", "four", "2026-12-01"),
            Err(PipelineError::InvalidPlanner(_))
        ));
        assert!(matches!(
            PlannerRequest::parse("Chemistry", "4", "01/12/2026"),
            Err(PipelineError::InvalidPlanner(_))
        ));
    }

    #[test]
    fn blank_subject_yields_empty_body() {
        let request = PlannerRequest::new("  ", 2, exam_date()).expect("planner");

        assert_eq!(request.body(), "");
    }
}
