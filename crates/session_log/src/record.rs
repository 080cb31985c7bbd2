use serde::{Deserialize, Serialize};

/// One successful interaction. Records are only ever handed out by shared
/// reference, so they cannot change after [`crate::SessionLog::append`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InteractionRecord {
    pub ordinal: usize,
    pub feature_name: String,
    pub input_text: String,
    pub output_text: String,
}

impl InteractionRecord {
    #[must_use]
    pub(crate) fn new(
        ordinal: usize,
        feature_name: impl Into<String>,
        input_text: impl Into<String>,
        output_text: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            feature_name: feature_name.into(),
            input_text: input_text.into(),
            output_text: output_text.into(),
        }
    }
}
