//! The training engine seam.
//!
//! The optimization loop (gradients, optimizer steps, checkpointing) lives behind
//! [`TrainingEngine`]. The pipeline only hands it a [`RunConfig`], a freshly
//! instantiated model and the tokenized splits, and gets a trained model back.

use crate::dataset::Split;
use crate::error::{PipelineError, PipelineResult};
use crate::hyperparams::{EvaluationStrategy, HyperparameterConfig};
use crate::layout::OutputLayout;
use crate::model::{BaseModel, TrainedModel};
use crate::tokenize::TokenizedExample;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Run configuration handed to the engine, one field per engine knob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    pub num_train_epochs: u32,
    pub warmup_steps: u64,
    pub weight_decay: f64,
    pub per_device_train_batch_size: u32,
    pub gradient_accumulation_steps: u32,
    pub learning_rate: f64,
    pub eval_strategy: EvaluationStrategy,
    pub fp16: bool,
    pub logging_dir: PathBuf,
    pub dataloader_num_workers: u32,
    pub use_cpu: bool,
}

impl RunConfig {
    #[must_use]
    pub fn from_hyperparameters(hyperparameters: &HyperparameterConfig, output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            num_train_epochs: hyperparameters.num_epochs,
            warmup_steps: hyperparameters.warmup_steps,
            weight_decay: hyperparameters.weight_decay,
            per_device_train_batch_size: hyperparameters.per_device_train_batch_size,
            gradient_accumulation_steps: hyperparameters.gradient_accumulation_steps,
            learning_rate: hyperparameters.learning_rate,
            eval_strategy: hyperparameters.evaluation_strategy,
            fp16: hyperparameters.fp16,
            logging_dir: output_dir.to_path_buf(),
            dataloader_num_workers: hyperparameters.dataloader_num_workers,
            use_cpu: hyperparameters.use_cpu,
        }
    }
}

#[async_trait]
pub trait TrainingEngine: Send + Sync {
    fn id(&self) -> &'static str;

    /// Train `model` and return it once training completes.
    ///
    /// Failures are reported as [`PipelineError::TrainingEngine`] and are never retried.
    async fn run(
        &self,
        config: &RunConfig,
        model: BaseModel,
        train: &[TokenizedExample],
        validation: &[TokenizedExample],
    ) -> PipelineResult<TrainedModel>;
}

/// Request document passed to an external engine program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    pub run_config: RunConfig,
    pub base_model_dir: PathBuf,
    pub train_path: PathBuf,
    pub validation_path: PathBuf,
    pub final_model_dir: PathBuf,
}

/// Drives an external training program.
///
/// The program is invoked as `<program> <args...> <request.json>` and must write
/// the trained model (`config.json`, weights, optional `metrics.json`) into the
/// request's `final_model_dir` before exiting with status 0.
///
/// The exchange area is removed once the trained model has been read back, so a
/// successful run leaves only the exported artifacts. After a failure it is kept
/// for inspection.
#[derive(Debug, Clone)]
pub struct CommandTrainingEngine {
    program: String,
    args: Vec<String>,
}

impl CommandTrainingEngine {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    fn prepare(
        &self,
        config: &RunConfig,
        model: &BaseModel,
        train: &[TokenizedExample],
        validation: &[TokenizedExample],
    ) -> PipelineResult<EngineRequest> {
        let layout = OutputLayout::new(config.output_dir.clone());
        layout.ensure_engine_dirs()?;

        let final_model_dir = layout.final_model_dir();
        if final_model_dir.exists() {
            std::fs::remove_dir_all(&final_model_dir)?;
        }

        let request = EngineRequest {
            run_config: config.clone(),
            base_model_dir: model.dir().to_path_buf(),
            train_path: layout.engine_split_path(Split::Train),
            validation_path: layout.engine_split_path(Split::Validation),
            final_model_dir,
        };
        write_jsonl(&request.train_path, train)?;
        write_jsonl(&request.validation_path, validation)?;
        std::fs::write(layout.engine_request_path(), serde_json::to_string_pretty(&request)?)?;
        Ok(request)
    }
}

pub fn write_jsonl(path: &Path, rows: &[TokenizedExample]) -> PipelineResult<()> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    std::fs::write(path, out)?;
    Ok(())
}

#[async_trait]
impl TrainingEngine for CommandTrainingEngine {
    fn id(&self) -> &'static str {
        "command"
    }

    async fn run(
        &self,
        config: &RunConfig,
        model: BaseModel,
        train: &[TokenizedExample],
        validation: &[TokenizedExample],
    ) -> PipelineResult<TrainedModel> {
        let request = self.prepare(config, &model, train, validation)?;
        let request_path = OutputLayout::new(config.output_dir.clone()).engine_request_path();

        debug!(program = %self.program, args = ?self.args, request = %request_path.display(), "Launching training engine");
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&request_path)
            .status()
            .await
            .map_err(|e| {
                error!(error = %e, program = %self.program, "Failed to launch training engine");
                PipelineError::TrainingEngine(format!("failed to launch `{}`: {e}", self.program))
            })?;

        if !status.success() {
            error!(status = %status, program = %self.program, "Training engine failed");
            return Err(PipelineError::TrainingEngine(format!("`{}` exited with {status}", self.program)));
        }

        let trained = TrainedModel::load_dir(&request.final_model_dir).map_err(|e| match e {
            PipelineError::TrainingEngine(msg) => PipelineError::TrainingEngine(msg),
            other => PipelineError::TrainingEngine(format!(
                "cannot read trained model from {}: {other}",
                request.final_model_dir.display()
            )),
        })?;
        info!(weights = %trained.weights_file, steps = ?trained.metrics.steps, "Training engine finished");

        let engine_dir = OutputLayout::new(config.output_dir.clone()).engine_dir();
        if let Err(e) = std::fs::remove_dir_all(&engine_dir) {
            warn!(error = %e, path = %engine_dir.display(), "Failed to remove engine exchange area");
        }
        Ok(trained)
    }
}
