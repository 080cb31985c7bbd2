use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize record {ordinal}: {source}")]
    JsonSerialize {
        ordinal: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionLogError {
    #[must_use]
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    #[must_use]
    pub fn json_serialize(ordinal: usize, source: serde_json::Error) -> Self {
        Self::JsonSerialize { ordinal, source }
    }
}
