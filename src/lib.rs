//! Study assistant: a fixed set of study features over one completion provider.
//!
//! Every user action flows through [`pipeline::Pipeline::run`]: the input is
//! normalized to plain text, a feature template is prepended, one completion is
//! requested, and successful answers are appended to the session log. The
//! [`shell`] module drives that pipeline from a terminal.

pub mod completion;
pub mod concept_map;
pub mod config;
pub mod deck;
pub mod export;
pub mod features;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod render;
pub mod shell;

pub use completion::{CompletionClient, CompletionResult, MODEL_NOT_INITIALIZED};
pub use config::{AppConfig, LoadedConfig};
pub use features::{Feature, InputShape, RenderMode};
pub use pipeline::{Completed, FeatureInput, Pipeline, PipelineError, PlannerRequest};
pub use session_log::{SessionState, Theme};
