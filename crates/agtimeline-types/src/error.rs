use thiserror::Error;

/// Rejection produced when a snapshot payload does not match the expected schema
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Root value is not a JSON object
    #[error("snapshot root must be an object, got {0}")]
    NotAnObject(&'static str),

    /// A required top-level field is missing or has the wrong shape
    #[error("missing or malformed field `{0}`")]
    MissingField(&'static str),

    /// A single event failed validation
    #[error("invalid event at index {index}: {reason}")]
    InvalidEvent { index: usize, reason: String },

    /// An optional section is present but malformed
    #[error("invalid `{field}`: {reason}")]
    InvalidSection { field: &'static str, reason: String },
}
