use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Weight file names a pretrained model directory may carry, in preference order.
pub const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// A pretrained model instantiated from a local directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseModel {
    dir: PathBuf,
    config: serde_json::Value,
}

impl BaseModel {
    pub fn from_pretrained(dir: &Path) -> PipelineResult<Self> {
        let config_path = dir.join("config.json");
        let bytes = std::fs::read(&config_path).map_err(|e| {
            PipelineError::ModelLoad(format!("cannot read {}: {e}", config_path.display()))
        })?;
        let config: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::ModelLoad(format!("invalid model config {}: {e}", config_path.display()))
        })?;
        if !config.is_object() {
            return Err(PipelineError::ModelLoad(format!(
                "model config {} is not a JSON object",
                config_path.display()
            )));
        }

        let model = Self { dir: dir.to_path_buf(), config };
        info!(
            path = %dir.display(),
            model_type = model.model_type().unwrap_or("unknown"),
            "Loaded pretrained model for fine-tuning"
        );
        Ok(model)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    #[must_use]
    pub fn model_type(&self) -> Option<&str> {
        self.config.get("model_type").and_then(serde_json::Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingMetrics {
    pub train_loss: Option<f64>,
    pub eval_loss: Option<f64>,
    pub steps: Option<u64>,
}

/// A fine-tuned model held in memory until it is exported.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub config: serde_json::Value,
    pub weights_file: String,
    pub weights: Vec<u8>,
    pub metrics: TrainingMetrics,
}

impl TrainedModel {
    /// Read a model directory written by a training engine.
    pub fn load_dir(dir: &Path) -> PipelineResult<Self> {
        let config: serde_json::Value = serde_json::from_slice(&std::fs::read(dir.join("config.json"))?)?;
        let weights_file = WEIGHT_FILES
            .iter()
            .find(|name| dir.join(name).is_file())
            .ok_or_else(|| {
                PipelineError::TrainingEngine(format!("no weights file in trained model dir {}", dir.display()))
            })?;
        let weights = std::fs::read(dir.join(weights_file))?;

        let metrics_path = dir.join("metrics.json");
        let metrics = if metrics_path.is_file() {
            serde_json::from_slice(&std::fs::read(metrics_path)?)?
        } else {
            TrainingMetrics::default()
        };

        Ok(Self { config, weights_file: (*weights_file).to_string(), weights, metrics })
    }

    /// Write the native projection (config + weights) into `dir`.
    pub fn save_pretrained(&self, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join("config.json");
        std::fs::write(&config_path, serde_json::to_string_pretty(&self.config)?)?;
        let weights_path = dir.join(&self.weights_file);
        std::fs::write(&weights_path, &self.weights)?;
        Ok(vec![config_path, weights_path])
    }
}
