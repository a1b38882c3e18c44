use crate::dataset::{DatasetDict, Split};
use crate::engine::{RunConfig, TrainingEngine};
use crate::error::{PipelineError, PipelineResult};
use crate::hyperparams::HyperparameterConfig;
use crate::model::{BaseModel, TrainedModel};
use crate::progress::{ProgressEvent, ProgressSink, RunId};
use crate::tokenize::{tokenize_dataset, TextEncoder, TokenizationOptions, TokenizedDataset};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Linear lifecycle of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initialized,
    Tokenized,
    Configured,
    Training,
    Trained,
}

impl PipelineStage {
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Initialized => Some(Self::Tokenized),
            Self::Tokenized => Some(Self::Configured),
            Self::Configured => Some(Self::Training),
            Self::Training => Some(Self::Trained),
            Self::Trained => None,
        }
    }
}

/// Tokenizes the dataset, maps hyperparameters onto the engine's run
/// configuration and hands training to a [`TrainingEngine`].
pub struct TrainingOrchestrator<'a> {
    run_id: RunId,
    engine: &'a dyn TrainingEngine,
    progress: &'a dyn ProgressSink,
    stage: PipelineStage,
}

impl<'a> TrainingOrchestrator<'a> {
    pub fn new(run_id: RunId, engine: &'a dyn TrainingEngine, progress: &'a dyn ProgressSink) -> Self {
        Self { run_id, engine, progress, stage: PipelineStage::Initialized }
    }

    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, to: PipelineStage) -> PipelineResult<()> {
        if self.stage.next() != Some(to) {
            return Err(PipelineError::InvalidTransition(format!("{:?} -> {:?}", self.stage, to)));
        }
        self.stage = to;
        self.progress.on_event(ProgressEvent::Stage { run_id: self.run_id.clone(), stage: to });
        Ok(())
    }

    fn message(&self, message: String) {
        self.progress.on_event(ProgressEvent::Message { run_id: self.run_id.clone(), message });
    }

    /// Encode every split. Train and validation must be present.
    pub fn tokenize(
        &mut self,
        dataset: &DatasetDict,
        encoder: &dyn TextEncoder,
        options: &TokenizationOptions,
    ) -> PipelineResult<TokenizedDataset> {
        if self.stage != PipelineStage::Initialized {
            return Err(PipelineError::InvalidTransition(format!("cannot tokenize in stage {:?}", self.stage)));
        }
        dataset.require(Split::Train)?;
        dataset.require(Split::Validation)?;

        let tokenized = tokenize_dataset(dataset, encoder, options)?;
        self.message(format!(
            "Tokenized dataset `{}` to max length {}",
            dataset.name(),
            tokenized.max_length()
        ));
        self.advance(PipelineStage::Tokenized)?;
        Ok(tokenized)
    }

    pub fn configure(&mut self, hyperparameters: &HyperparameterConfig, output_dir: &Path) -> PipelineResult<RunConfig> {
        if self.stage != PipelineStage::Tokenized {
            return Err(PipelineError::InvalidTransition(format!("cannot configure in stage {:?}", self.stage)));
        }
        let config = RunConfig::from_hyperparameters(hyperparameters, output_dir);
        self.advance(PipelineStage::Configured)?;
        Ok(config)
    }

    /// Run the engine. Engine errors propagate unchanged and leave the run in `Training`.
    pub async fn train(
        &mut self,
        model: BaseModel,
        config: &RunConfig,
        data: &TokenizedDataset,
    ) -> PipelineResult<TrainedModel> {
        let train = data.require(Split::Train)?;
        let validation = data.require(Split::Validation)?;
        self.advance(PipelineStage::Training)?;

        self.message(format!(
            "Training with engine `{}` on {} train / {} validation examples",
            self.engine.id(),
            train.len(),
            validation.len()
        ));
        let trained = self.engine.run(config, model, train, validation).await?;

        self.advance(PipelineStage::Trained)?;
        Ok(trained)
    }
}
