//! Training command implementation.

use super::present_pairs;
use anyhow::{Context, Result};
use clap::Args;
use tunesmith_training::settings::{DATASET_PATH, MODEL_PATH, OUTPUT_PATH, TRAINING_ARGUMENTS_PATH};
use tunesmith_training::{
    CommandTrainingEngine, ExportManifest, FineTunePipeline, ModelExporter, OptimumCliExporter,
    ResolvedTrainingConfig, TracingProgressSink,
};

/// Program invoked as the training engine when --engine-command is not given.
pub const DEFAULT_ENGINE_COMMAND: &str = "tunesmith-engine";

#[derive(Args, Debug)]
pub struct TrainCommand {
    /// Directory holding the pretrained model and its tokenizer
    #[arg(long = "model-path", env = "MODEL_PATH")]
    pub model_path: Option<String>,

    /// Dataset directory with train/validation/test splits
    #[arg(long = "dataset-path", env = "DATASET_PATH")]
    pub dataset_path: Option<String>,

    /// JSON document with training hyperparameters
    #[arg(long = "training-arguments-path", env = "TRAINING_ARGUMENTS_PATH")]
    pub training_arguments_path: Option<String>,

    /// Directory that receives the exported models
    #[arg(long = "output-path", env = "OUTPUT_PATH")]
    pub output_path: Option<String>,

    /// Training engine program
    #[arg(long, default_value = DEFAULT_ENGINE_COMMAND)]
    pub engine_command: String,

    /// Extra argument passed to the engine before the request file (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Program used to trace the portable graph (optimum-cli compatible)
    #[arg(long, default_value = "optimum-cli")]
    pub graph_exporter: String,

    /// Print the export manifest as JSON
    #[arg(long)]
    pub json: bool,
}

impl TrainCommand {
    fn setting_pairs(&self) -> Vec<(&'static str, String)> {
        present_pairs([
            (MODEL_PATH, self.model_path.as_ref()),
            (DATASET_PATH, self.dataset_path.as_ref()),
            (TRAINING_ARGUMENTS_PATH, self.training_arguments_path.as_ref()),
            (OUTPUT_PATH, self.output_path.as_ref()),
        ])
    }
}

pub async fn execute(command: TrainCommand) -> Result<()> {
    let config = ResolvedTrainingConfig::resolve(command.setting_pairs())
        .context("Failed to resolve training settings")?;

    let pipeline = FineTunePipeline::new(
        Box::new(CommandTrainingEngine::new(command.engine_command.clone(), command.engine_args.clone())),
        ModelExporter::new(Box::new(OptimumCliExporter::new(command.graph_exporter.clone()))),
        Box::new(TracingProgressSink),
    );

    let manifest = pipeline.run_from_settings(&config).await.context("Fine-tuning run failed")?;
    print_summary(&manifest, command.json)
}

fn print_summary(manifest: &ExportManifest, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(manifest)?);
        return Ok(());
    }

    println!("Run {} complete", manifest.run_id);
    println!("  native model:   {}", manifest.native_dir.display());
    println!("  portable model: {}", manifest.portable_dir.display());
    if let Some(loss) = manifest.metrics.eval_loss {
        println!("  eval loss:      {loss}");
    }
    Ok(())
}
