use thiserror::Error;

pub type ParityResult<T> = Result<T, ParityError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParityError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid time resolution: resolution_ms={resolution_ms} (must be > 0)")]
    InvalidResolution { resolution_ms: i64 },

    #[error("series length mismatch: timestamps={timestamps}, values={values}")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("duplicate child name `{0}` in object node")]
    DuplicateChild(String),

    #[error("no computation paths registered for kind `{0}`")]
    UnknownComputation(String),

    #[error("stage `{stage}` failed: {message}")]
    Stage { stage: String, message: String },

    #[error("{path} computation failed: {message}")]
    Computation {
        path: &'static str,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}
