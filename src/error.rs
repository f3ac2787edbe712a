use thiserror::Error;

/// Fatal errors. All of these surface at construction time; evaluation-time
/// code paths never fail and encode a missing reaction channel as 0.0.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("variable name `{0}` carries no `v`/`i` species marker")]
    VariableDecode(String),

    #[error("variable name `{0}` has no trailing size digits")]
    VariableSize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
