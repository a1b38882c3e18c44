use crate::dataset::Split;
use crate::error::PipelineResult;
use std::path::{Path, PathBuf};

/// Filesystem layout under a run's output directory.
///
/// ```text
/// <output>/trained_model/        native model + tokenizer
/// <output>/trained_model_onnx/   portable graph + tokenizer
/// <output>/engine/               engine exchange area, removed after a successful run
/// <output>/export_manifest.json
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn native_model_dir(&self) -> PathBuf {
        self.root.join("trained_model")
    }

    #[must_use]
    pub fn portable_model_dir(&self) -> PathBuf {
        self.root.join("trained_model_onnx")
    }

    #[must_use]
    pub fn engine_dir(&self) -> PathBuf {
        self.root.join("engine")
    }

    #[must_use]
    pub fn engine_request_path(&self) -> PathBuf {
        self.engine_dir().join("request.json")
    }

    #[must_use]
    pub fn engine_split_path(&self, split: Split) -> PathBuf {
        self.engine_dir().join(format!("{}.jsonl", split.as_str()))
    }

    #[must_use]
    pub fn final_model_dir(&self) -> PathBuf {
        self.engine_dir().join("final_model")
    }

    #[must_use]
    pub fn export_manifest_path(&self) -> PathBuf {
        self.root.join("export_manifest.json")
    }

    pub fn ensure_engine_dirs(&self) -> PipelineResult<()> {
        std::fs::create_dir_all(self.engine_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path().to_path_buf());

        assert_eq!(layout.native_model_dir(), temp.path().join("trained_model"));
        assert_eq!(layout.portable_model_dir(), temp.path().join("trained_model_onnx"));
        assert!(layout.engine_split_path(Split::Validation).ends_with("engine/validation.jsonl"));
        assert!(layout.final_model_dir().starts_with(layout.engine_dir()));

        layout.ensure_engine_dirs().unwrap();
        assert!(layout.engine_dir().is_dir());
    }
}
