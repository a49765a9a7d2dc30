use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("invalid invocation: {0}")]
    Usage(String),
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("malformed input: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("label table has {labels} entries but the model declares {classes} classes")]
    ConfigMismatch { labels: usize, classes: usize },
}

impl From<ort::Error> for DetectError {
    fn from(err: ort::Error) -> Self {
        DetectError::Inference(err.to_string())
    }
}

pub type DetectResult<T> = Result<T, DetectError>;
