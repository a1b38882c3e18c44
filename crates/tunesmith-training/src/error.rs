use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to parse training arguments: {0}")]
    TrainingArgumentsParse(String),

    #[error("dataset load error: {0}")]
    DatasetLoad(String),

    #[error("model load error: {0}")]
    ModelLoad(String),

    #[error("training engine error: {0}")]
    TrainingEngine(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("invalid pipeline transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
