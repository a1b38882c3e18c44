use thiserror::Error;
use tunesmith_training::PipelineError;

pub type EvalResult<T> = std::result::Result<T, EvaluationError>;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dataset load error: {0}")]
    DatasetLoad(String),

    #[error("inference request failed: {0}")]
    InferenceRequest(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<PipelineError> for EvaluationError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Configuration(msg) => Self::Configuration(msg),
            PipelineError::DatasetLoad(msg) => Self::DatasetLoad(msg),
            other => Self::Other(anyhow::Error::new(other)),
        }
    }
}
