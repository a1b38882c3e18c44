//! Dual-format export of a trained model.
//!
//! The native projection is written first; the portable graph is traced from it
//! by a [`GraphExporter`]. The two writes are independent: a failed portable
//! export leaves the native export in place.

use crate::error::{PipelineError, PipelineResult};
use crate::layout::OutputLayout;
use crate::model::{TrainedModel, TrainingMetrics};
use crate::progress::RunId;
use crate::tokenize::TextEncoder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Traces a native model directory into a portable inference graph.
#[async_trait]
pub trait GraphExporter: Send + Sync {
    fn id(&self) -> &'static str;

    async fn export(&self, native_dir: &Path, target_dir: &Path) -> PipelineResult<()>;
}

/// Exports through `optimum-cli export onnx`.
#[derive(Debug, Clone)]
pub struct OptimumCliExporter {
    program: String,
}

impl OptimumCliExporter {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for OptimumCliExporter {
    fn default() -> Self {
        Self::new("optimum-cli")
    }
}

#[async_trait]
impl GraphExporter for OptimumCliExporter {
    fn id(&self) -> &'static str {
        "optimum-onnx"
    }

    async fn export(&self, native_dir: &Path, target_dir: &Path) -> PipelineResult<()> {
        debug!(program = %self.program, native = %native_dir.display(), target = %target_dir.display(), "Tracing portable graph");
        let status = tokio::process::Command::new(&self.program)
            .args(["export", "onnx", "--model"])
            .arg(native_dir)
            .args(["--task", "text-classification"])
            .arg(target_dir)
            .status()
            .await
            .map_err(|e| PipelineError::Export(format!("failed to launch `{}`: {e}", self.program)))?;

        if !status.success() {
            return Err(PipelineError::Export(format!("`{}` exited with {status}", self.program)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Native,
    Portable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedFile {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
    pub base_model: PathBuf,
    pub native_dir: PathBuf,
    pub portable_dir: PathBuf,
    #[serde(default)]
    pub metrics: TrainingMetrics,
    pub artifacts: Vec<ExportedFile>,
}

pub fn sha256_file(path: &Path) -> PipelineResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn collect_files(kind: &ArtifactKind, dir: &Path) -> PipelineResult<Vec<ExportedFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::Export(format!("cannot walk {}: {e}", dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        let sha256 = sha256_file(&path)?;
        files.push(ExportedFile { kind: kind.clone(), path, sha256 });
    }
    Ok(files)
}

/// Writes `<output>/trained_model` and `<output>/trained_model_onnx`.
pub struct ModelExporter {
    graph_exporter: Box<dyn GraphExporter>,
}

impl ModelExporter {
    #[must_use]
    pub fn new(graph_exporter: Box<dyn GraphExporter>) -> Self {
        Self { graph_exporter }
    }

    /// Export both projections. Consumes the trained model; it is dropped once both writes finish.
    pub async fn export(
        &self,
        run_id: &RunId,
        base_model: &Path,
        model: TrainedModel,
        tokenizer: &dyn TextEncoder,
        layout: &OutputLayout,
    ) -> PipelineResult<ExportManifest> {
        let native_dir = layout.native_model_dir();
        info!(path = %native_dir.display(), "Writing trained model");
        model
            .save_pretrained(&native_dir)
            .and_then(|_| tokenizer.save_pretrained(&native_dir))
            .map_err(|e| export_error(&native_dir, &e))?;

        let portable_dir = layout.portable_model_dir();
        info!(path = %portable_dir.display(), exporter = self.graph_exporter.id(), "Writing portable graph model");
        std::fs::create_dir_all(&portable_dir).map_err(|e| export_error(&portable_dir, &PipelineError::from(e)))?;
        self.graph_exporter.export(&native_dir, &portable_dir).await.map_err(|e| {
            error!(error = %e, "Portable graph export failed; native export kept");
            match e {
                PipelineError::Export(msg) => PipelineError::Export(msg),
                other => export_error(&portable_dir, &other),
            }
        })?;
        tokenizer.save_pretrained(&portable_dir).map_err(|e| export_error(&portable_dir, &e))?;

        let metrics = model.metrics.clone();
        drop(model);

        let mut artifacts = collect_files(&ArtifactKind::Native, &native_dir)?;
        artifacts.extend(collect_files(&ArtifactKind::Portable, &portable_dir)?);
        let manifest = ExportManifest {
            run_id: run_id.clone(),
            created_at: Utc::now(),
            base_model: base_model.to_path_buf(),
            native_dir,
            portable_dir,
            metrics,
            artifacts,
        };
        let manifest_path = layout.export_manifest_path();
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
            .map_err(|e| export_error(&manifest_path, &PipelineError::from(e)))?;
        Ok(manifest)
    }
}

fn export_error(target: &Path, err: &PipelineError) -> PipelineError {
    PipelineError::Export(format!("cannot write {}: {err}", target.display()))
}
