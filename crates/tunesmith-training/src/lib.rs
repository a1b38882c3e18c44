//! Tunesmith Training
//!
//! Fine-tuning pipeline for text-classification models:
//! - Resolving run settings and hyperparameters (`ResolvedTrainingConfig`)
//! - Loading labeled datasets and tokenizing every split
//! - Orchestrating a run through a pluggable `TrainingEngine`
//! - Exporting the trained model in native and portable-graph formats

pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod hyperparams;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod settings;
pub mod tokenize;

pub use dataset::{load_dataset, load_split, DatasetDict, Example, Label, Split};
pub use engine::{CommandTrainingEngine, EngineRequest, RunConfig, TrainingEngine};
pub use error::{PipelineError, PipelineResult};
pub use export::{ArtifactKind, ExportManifest, ExportedFile, GraphExporter, ModelExporter, OptimumCliExporter};
pub use hyperparams::{EvaluationStrategy, HyperparameterConfig};
pub use layout::OutputLayout;
pub use model::{BaseModel, TrainedModel, TrainingMetrics};
pub use orchestrator::{PipelineStage, TrainingOrchestrator};
pub use pipeline::FineTunePipeline;
pub use progress::{ProgressEvent, ProgressSink, RunId, TracingProgressSink};
pub use settings::{AliasMap, ResolvedTrainingConfig, TrainingSettings};
pub use tokenize::{
    tokenize_dataset, HfTokenizer, TextEncoder, TokenizationOptions, TokenizedDataset, TokenizedExample,
    TokenizerFiles,
};
