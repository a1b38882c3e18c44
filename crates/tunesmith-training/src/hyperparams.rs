use crate::error::{PipelineError, PipelineResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// How often the engine evaluates on the validation split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    No,
    Steps,
    #[default]
    Epoch,
}

/// Hyperparameters read from the training-arguments document.
///
/// Every field is independently optional in the document; absent fields take
/// the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterConfig {
    #[serde(deserialize_with = "integral")]
    pub num_epochs: u32,
    #[serde(deserialize_with = "integral")]
    pub warmup_steps: u64,
    pub weight_decay: f64,
    #[serde(deserialize_with = "integral")]
    pub per_device_train_batch_size: u32,
    #[serde(deserialize_with = "integral")]
    pub gradient_accumulation_steps: u32,
    pub learning_rate: f64,
    pub evaluation_strategy: EvaluationStrategy,
    pub fp16: bool,
    #[serde(deserialize_with = "integral")]
    pub dataloader_num_workers: u32,
    pub use_cpu: bool,
}

/// Accepts non-negative integers and integral floats such as `5.0`.
fn integral<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    let whole = number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    });
    whole
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {number}")))
}

impl Default for HyperparameterConfig {
    fn default() -> Self {
        Self {
            num_epochs: 3,
            warmup_steps: 500,
            weight_decay: 0.01,
            per_device_train_batch_size: 8,
            gradient_accumulation_steps: 4,
            learning_rate: 2e-5,
            evaluation_strategy: EvaluationStrategy::Epoch,
            fp16: false,
            dataloader_num_workers: 4,
            use_cpu: false,
        }
    }
}

impl HyperparameterConfig {
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("cannot read training arguments {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a training-arguments document.
    ///
    /// The document must be a JSON object; unknown keys are ignored.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| PipelineError::TrainingArgumentsParse(format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(PipelineError::TrainingArgumentsParse(
                "training arguments must be a JSON object".to_string(),
            ));
        }
        let config: Self = serde_json::from_value(value)
            .map_err(|e| PipelineError::TrainingArgumentsParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.num_epochs == 0 {
            return Err(PipelineError::TrainingArgumentsParse("num_epochs must be >= 1".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PipelineError::TrainingArgumentsParse("learning_rate must be > 0".to_string()));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(PipelineError::TrainingArgumentsParse("weight_decay must be >= 0".to_string()));
        }
        if self.per_device_train_batch_size == 0 {
            return Err(PipelineError::TrainingArgumentsParse(
                "per_device_train_batch_size must be >= 1".to_string(),
            ));
        }
        if self.gradient_accumulation_steps == 0 {
            return Err(PipelineError::TrainingArgumentsParse(
                "gradient_accumulation_steps must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
