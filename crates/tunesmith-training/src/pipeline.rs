use crate::dataset::load_dataset;
use crate::engine::TrainingEngine;
use crate::error::PipelineResult;
use crate::export::{ExportManifest, ModelExporter};
use crate::model::BaseModel;
use crate::orchestrator::TrainingOrchestrator;
use crate::progress::{ProgressEvent, ProgressSink, RunId};
use crate::settings::ResolvedTrainingConfig;
use crate::tokenize::{HfTokenizer, TextEncoder, TokenizationOptions};
use std::path::Path;
use tracing::info;

/// End-to-end fine-tuning run: dataset → tokenization → training → export.
pub struct FineTunePipeline {
    engine: Box<dyn TrainingEngine>,
    exporter: ModelExporter,
    progress: Box<dyn ProgressSink>,
    tokenization: TokenizationOptions,
}

impl FineTunePipeline {
    #[must_use]
    pub fn new(engine: Box<dyn TrainingEngine>, exporter: ModelExporter, progress: Box<dyn ProgressSink>) -> Self {
        Self { engine, exporter, progress, tokenization: TokenizationOptions::default() }
    }

    #[must_use]
    pub fn with_tokenization(mut self, options: TokenizationOptions) -> Self {
        self.tokenization = options;
        self
    }

    /// Instantiate the base model and tokenizer from `model-path`, then run.
    pub async fn run_from_settings(&self, config: &ResolvedTrainingConfig) -> PipelineResult<ExportManifest> {
        let model_dir = Path::new(&config.settings.training_model_path);
        let model = BaseModel::from_pretrained(model_dir)?;
        let tokenizer = HfTokenizer::from_pretrained(model_dir)?;
        self.run(config, model, &tokenizer).await
    }

    pub async fn run(
        &self,
        config: &ResolvedTrainingConfig,
        model: BaseModel,
        tokenizer: &dyn TextEncoder,
    ) -> PipelineResult<ExportManifest> {
        let settings = &config.settings;
        let run_id = RunId::new();
        self.progress.on_event(ProgressEvent::Started { run_id: run_id.clone() });

        info!(path = %settings.dataset_path, "Loading dataset for fine-tuning");
        let dataset = load_dataset(Path::new(&settings.dataset_path))?;

        let mut orchestrator = TrainingOrchestrator::new(run_id.clone(), self.engine.as_ref(), self.progress.as_ref());
        let tokenized = orchestrator.tokenize(&dataset, tokenizer, &self.tokenization)?;
        drop(dataset);

        let layout = settings.output_layout();
        let run_config = orchestrator.configure(&config.hyperparameters, layout.root())?;
        let base_model_dir = model.dir().to_path_buf();
        let trained = orchestrator.train(model, &run_config, &tokenized).await?;

        let manifest = self.exporter.export(&run_id, &base_model_dir, trained, tokenizer, &layout).await?;
        self.progress.on_event(ProgressEvent::Finished { run_id });
        Ok(manifest)
    }
}
