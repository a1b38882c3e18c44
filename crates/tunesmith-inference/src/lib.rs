//! Tunesmith Inference
//!
//! Evaluation client for a served fine-tuned model:
//! - Resolving evaluation settings (`EvaluationSettings`)
//! - Iterating the test split in shuffled order
//! - Sending each text through a forward proxy to the inference endpoint
//! - Aggregating exact-match accuracy (`EvaluationResult`)

pub mod client;
pub mod error;
pub mod evaluator;
pub mod sampler;
pub mod settings;

pub use client::{HttpInferenceClient, InferenceClient};
pub use error::{EvalResult, EvaluationError};
pub use evaluator::{evaluate, run_evaluation, EvaluationResult};
pub use sampler::ShuffledExamples;
pub use settings::EvaluationSettings;
