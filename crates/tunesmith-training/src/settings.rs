//! Run settings resolved from alias-bound key/value pairs.
//!
//! The CLI hands every resolver a flat list of `(alias, value)` pairs. Keeping
//! resolution independent from the argument parser lets the same rules apply to
//! command-line flags, environment fallbacks and tests.

use crate::error::{PipelineError, PipelineResult};
use crate::hyperparams::HyperparameterConfig;
use crate::layout::OutputLayout;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub const MODEL_PATH: &str = "model-path";
pub const DATASET_PATH: &str = "dataset-path";
pub const TRAINING_ARGUMENTS_PATH: &str = "training-arguments-path";
pub const OUTPUT_PATH: &str = "output-path";

/// Alias → value lookup with "last one wins" semantics for repeated aliases.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    values: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Returns the value bound to `alias`, failing when it is absent or blank.
    pub fn required(&self, alias: &str) -> PipelineResult<String> {
        match self.values.get(alias) {
            Some(value) if !value.trim().is_empty() => Ok(value.clone()),
            Some(_) => Err(PipelineError::Configuration(format!("setting `{alias}` must not be empty"))),
            None => Err(PipelineError::Configuration(format!("missing required setting `{alias}`"))),
        }
    }

    #[must_use]
    pub fn optional(&self, alias: &str) -> Option<&str> {
        self.values.get(alias).map(String::as_str).filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { values }
    }
}

/// Paths for one fine-tuning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSettings {
    pub training_model_path: String,
    pub dataset_path: String,
    pub training_arguments_path: String,
    pub output_path: String,
}

impl TrainingSettings {
    pub fn from_pairs<I, K, V>(pairs: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = AliasMap::from_pairs(pairs);
        let settings = Self {
            training_model_path: map.required(MODEL_PATH)?,
            dataset_path: map.required(DATASET_PATH)?,
            training_arguments_path: map.required(TRAINING_ARGUMENTS_PATH)?,
            output_path: map.required(OUTPUT_PATH)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !Path::new(&self.training_model_path).is_dir() {
            return Err(PipelineError::Configuration(format!(
                "`{MODEL_PATH}` does not resolve to a directory: {}",
                self.training_model_path
            )));
        }
        ensure_readable_file(TRAINING_ARGUMENTS_PATH, &self.training_arguments_path)
    }

    #[must_use]
    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::new(self.output_path.clone().into())
    }
}

fn ensure_readable_file(alias: &str, path: &str) -> PipelineResult<()> {
    let path = Path::new(path);
    if !path.is_file() {
        return Err(PipelineError::Configuration(format!(
            "`{alias}` does not resolve to a file: {}",
            path.display()
        )));
    }
    std::fs::File::open(path).map_err(|e| {
        PipelineError::Configuration(format!("`{alias}` is not readable ({}): {e}", path.display()))
    })?;
    Ok(())
}

/// Settings plus hyperparameters, resolved once at the start of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrainingConfig {
    pub settings: TrainingSettings,
    pub hyperparameters: HyperparameterConfig,
}

impl ResolvedTrainingConfig {
    pub fn resolve<I, K, V>(pairs: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let settings = TrainingSettings::from_pairs(pairs)?;
        info!(path = %settings.training_arguments_path, "Loading training arguments");
        let hyperparameters = HyperparameterConfig::from_file(Path::new(&settings.training_arguments_path))?;
        Ok(Self { settings, hyperparameters })
    }
}
