use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Ground-truth class of an example: a numeric class id or a class name.
///
/// Numeric labels compare by value, so `1`, `1.0` and `true` all match `Id(1)`.
/// Strings never match numbers: `1` and `"1"` are different labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Id(i64),
    Name(String),
}

impl Label {
    /// Whether a decoded JSON value equals this label.
    #[must_use]
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Self::Id(id), serde_json::Value::Number(n)) => match n.as_i64() {
                Some(v) => v == *id,
                None => n.as_f64() == Some(*id as f64),
            },
            (Self::Id(id), serde_json::Value::Bool(b)) => i64::from(*b) == *id,
            (Self::Name(name), serde_json::Value::String(s)) => s == name,
            _ => false,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Name(name) => name.fmt(f),
        }
    }
}

/// A single labeled text example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Self; 3] = [Self::Train, Self::Validation, Self::Test];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named dataset: whichever of the train/validation/test splits exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDict {
    name: String,
    splits: BTreeMap<Split, Vec<Example>>,
}

impl DatasetDict {
    #[must_use]
    pub fn new(name: impl Into<String>, splits: BTreeMap<Split, Vec<Example>>) -> Self {
        Self { name: name.into(), splits }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, split: Split) -> Option<&[Example]> {
        self.splits.get(&split).map(Vec::as_slice)
    }

    pub fn require(&self, split: Split) -> PipelineResult<&[Example]> {
        self.get(split).ok_or_else(|| {
            PipelineError::DatasetLoad(format!("dataset `{}` has no `{split}` split", self.name))
        })
    }

    pub fn splits(&self) -> impl Iterator<Item = (Split, &[Example])> {
        self.splits.iter().map(|(split, examples)| (*split, examples.as_slice()))
    }
}

/// Load every split present in a dataset directory.
///
/// A split is stored as `<split>.jsonl` (one `{"text", "label"}` object per line)
/// or `<split>.csv` (header with `text` and `label` columns).
pub fn load_dataset(path: &Path) -> PipelineResult<DatasetDict> {
    ensure_dataset_dir(path)?;

    let mut splits = BTreeMap::new();
    for split in Split::ALL {
        if let Some(file) = split_file(path, split) {
            splits.insert(split, read_split_file(&file)?);
        }
    }

    if splits.is_empty() {
        return Err(PipelineError::DatasetLoad(format!(
            "no split files (train/validation/test .jsonl or .csv) found in {}",
            path.display()
        )));
    }

    Ok(DatasetDict::new(dataset_name(path), splits))
}

/// Load a single split of a dataset directory.
pub fn load_split(path: &Path, split: Split) -> PipelineResult<Vec<Example>> {
    ensure_dataset_dir(path)?;
    let file = split_file(path, split).ok_or_else(|| {
        PipelineError::DatasetLoad(format!("dataset {} has no `{split}` split", path.display()))
    })?;
    read_split_file(&file)
}

fn ensure_dataset_dir(path: &Path) -> PipelineResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::DatasetLoad(format!("dataset directory does not exist: {}", path.display())))
    }
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
}

fn split_file(dir: &Path, split: Split) -> Option<PathBuf> {
    ["jsonl", "csv"]
        .iter()
        .map(|ext| dir.join(format!("{}.{ext}", split.as_str())))
        .find(|p| p.is_file())
}

fn read_split_file(path: &Path) -> PipelineResult<Vec<Example>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_csv_split(path),
        _ => read_jsonl_split(path),
    }
}

pub fn read_jsonl_split(path: &Path) -> PipelineResult<Vec<Example>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::DatasetLoad(format!("failed to read {}: {e}", path.display())))?;

    let mut examples = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let ex: Example = serde_json::from_str(line).map_err(|e| {
            PipelineError::DatasetLoad(format!("failed to parse {} line {}: {}", path.display(), idx + 1, e))
        })?;
        examples.push(ex);
    }
    Ok(examples)
}

#[derive(Deserialize)]
struct CsvRow {
    text: String,
    label: String,
}

pub fn read_csv_split(path: &Path) -> PipelineResult<Vec<Example>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| PipelineError::DatasetLoad(format!("failed to open {}: {e}", path.display())))?;

    let mut examples = Vec::new();
    for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| {
            PipelineError::DatasetLoad(format!("failed to parse {} record {}: {}", path.display(), idx + 1, e))
        })?;
        let label = row.label.trim().parse::<i64>().map_or(Label::Name(row.label), Label::Id);
        examples.push(Example { text: row.text, label });
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_jsonl(dir: &Path, split: &str, rows: &[(&str, serde_json::Value)]) {
        let body: String = rows
            .iter()
            .map(|(text, label)| format!("{}\n", json!({"text": text, "label": label})))
            .collect();
        std::fs::write(dir.join(format!("{split}.jsonl")), body).unwrap();
    }

    #[test]
    fn test_load_dataset_reads_present_splits() {
        let temp = TempDir::new().unwrap();
        write_jsonl(temp.path(), "train", &[("good", json!(1)), ("bad", json!(0))]);
        write_jsonl(temp.path(), "validation", &[("fine", json!(1))]);

        let ds = load_dataset(temp.path()).unwrap();
        assert_eq!(ds.require(Split::Train).unwrap().len(), 2);
        assert_eq!(ds.require(Split::Validation).unwrap().len(), 1);
        assert!(ds.get(Split::Test).is_none());
        assert_eq!(ds.require(Split::Train).unwrap()[0].label, Label::Id(1));
    }

    #[test]
    fn test_missing_directory_is_dataset_error() {
        let temp = TempDir::new().unwrap();
        let err = load_dataset(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad(_)));
    }

    #[test]
    fn test_empty_directory_is_dataset_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(load_dataset(temp.path()).unwrap_err(), PipelineError::DatasetLoad(_)));
    }

    #[test]
    fn test_require_missing_split_is_dataset_error() {
        let temp = TempDir::new().unwrap();
        write_jsonl(temp.path(), "train", &[("good", json!(1))]);
        let ds = load_dataset(temp.path()).unwrap();
        let err = ds.require(Split::Validation).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad(ref m) if m.contains("validation")));
    }

    #[test]
    fn test_malformed_jsonl_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("test.jsonl"), "{\"text\": \"a\", \"label\": 1}\nnot json\n").unwrap();
        let err = load_split(temp.path(), Split::Test).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetLoad(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_csv_split_parses_integer_and_named_labels() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("test.csv"), "text,label\ngreat movie,1\nmeh,neutral\n").unwrap();
        let examples = load_split(temp.path(), Split::Test).unwrap();
        assert_eq!(examples[0].label, Label::Id(1));
        assert_eq!(examples[1].label, Label::Name("neutral".to_string()));
    }

    #[test]
    fn test_label_matching_compares_numbers_by_value() {
        assert!(Label::Id(1).matches(&json!(1)));
        assert!(Label::Id(1).matches(&json!(1.0)));
        assert!(Label::Id(1).matches(&json!(true)));
        assert!(Label::Id(0).matches(&json!(false)));
        assert!(!Label::Id(1).matches(&json!(1.5)));
        assert!(!Label::Id(1).matches(&json!("1")));
        assert!(!Label::Name("1".to_string()).matches(&json!(1)));
        assert!(Label::Name("pos".to_string()).matches(&json!("pos")));
        assert!(!Label::Name("pos".to_string()).matches(&json!(["pos"])));
    }
}
