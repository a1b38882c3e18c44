//! Dataset tokenization: padding-and-truncation encoding of every split.

use crate::dataset::{DatasetDict, Label, Split};
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokenizers::TruncationParams;
use tracing::{debug, info};

/// Sequence length used when the tokenizer config does not pin one.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Tokenizer configs use a huge sentinel for "no limit"; anything above this is treated as unset.
const MAX_LENGTH_SENTINEL: f64 = 1_000_000.0;

/// Files that make up a pretrained tokenizer's serialized state.
const TOKENIZER_FILES: [&str; 4] = ["tokenizer.json", "tokenizer_config.json", "special_tokens_map.json", "vocab.txt"];

/// Subword encoder used by the tokenization stage.
///
/// Implementations return token ids including any special tokens the tokenizer
/// adds, already truncated to [`TextEncoder::max_length`] so that truncation
/// only removes content tokens. Padding is applied by [`tokenize_dataset`].
pub trait TextEncoder: Send + Sync {
    fn encode_batch(&self, texts: &[&str]) -> PipelineResult<Vec<Vec<u32>>>;

    fn pad_id(&self) -> u32;

    fn max_length(&self) -> usize;

    /// Write the tokenizer's serialized vocabulary/config into `dir`.
    fn save_pretrained(&self, dir: &Path) -> PipelineResult<()>;
}

/// In-memory copy of the tokenizer files found in a model directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerFiles {
    files: Vec<(String, Vec<u8>)>,
}

impl TokenizerFiles {
    pub fn load(dir: &Path) -> PipelineResult<Self> {
        let mut files = Vec::new();
        for name in TOKENIZER_FILES {
            let path = dir.join(name);
            if path.is_file() {
                files.push((name.to_string(), std::fs::read(&path)?));
            }
        }
        Ok(Self { files })
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, bytes)| bytes.as_slice())
    }

    pub fn save(&self, dir: &Path) -> PipelineResult<()> {
        std::fs::create_dir_all(dir)?;
        for (name, bytes) in &self.files {
            std::fs::write(dir.join(name), bytes)?;
        }
        Ok(())
    }
}

/// A pretrained `tokenizers` tokenizer loaded from a model directory.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    files: TokenizerFiles,
    pad_id: u32,
    max_length: usize,
}

impl HfTokenizer {
    pub fn from_pretrained(dir: &Path) -> PipelineResult<Self> {
        let path = dir.join("tokenizer.json");
        let mut inner = tokenizers::Tokenizer::from_file(&path).map_err(|e| {
            PipelineError::ModelLoad(format!("cannot load tokenizer from {}: {e}", path.display()))
        })?;
        let files = TokenizerFiles::load(dir)?;

        let config: serde_json::Value = match files.get("tokenizer_config.json") {
            Some(bytes) => serde_json::from_slice(bytes).map_err(|e| {
                PipelineError::ModelLoad(format!(
                    "malformed tokenizer config {}: {e}",
                    dir.join("tokenizer_config.json").display()
                ))
            })?,
            None => serde_json::Value::Null,
        };
        let max_length = max_length_from_config(&config);
        let pad_token = pad_token_from_config(&config).unwrap_or("[PAD]");
        let pad_id = inner.token_to_id(pad_token).unwrap_or(0);

        // The post-processor reserves room for its special tokens when truncating.
        inner
            .with_truncation(Some(TruncationParams { max_length, ..TruncationParams::default() }))
            .map_err(|e| {
                PipelineError::ModelLoad(format!("cannot configure truncation for {}: {e}", path.display()))
            })?;
        inner.with_padding(None);

        info!(path = %dir.display(), max_length, pad_id, "Loaded tokenizer");
        Ok(Self { inner, files, pad_id, max_length })
    }
}

fn max_length_from_config(config: &serde_json::Value) -> usize {
    config
        .get("model_max_length")
        .and_then(serde_json::Value::as_f64)
        .filter(|len| *len >= 1.0 && *len <= MAX_LENGTH_SENTINEL)
        .map_or(DEFAULT_MAX_LENGTH, |len| len as usize)
}

fn pad_token_from_config(config: &serde_json::Value) -> Option<&str> {
    let token = config.get("pad_token")?;
    token.as_str().or_else(|| token.get("content").and_then(serde_json::Value::as_str))
}

impl TextEncoder for HfTokenizer {
    fn encode_batch(&self, texts: &[&str]) -> PipelineResult<Vec<Vec<u32>>> {
        let encodings = self
            .inner
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| PipelineError::Other(anyhow::anyhow!("tokenization failed: {e}")))?;

        Ok(encodings
            .iter()
            .map(|enc| {
                enc.get_ids()
                    .iter()
                    .zip(enc.get_attention_mask())
                    .filter(|(_, mask)| **mask == 1)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .collect())
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn save_pretrained(&self, dir: &Path) -> PipelineResult<()> {
        self.files.save(dir)
    }
}

#[derive(Debug, Clone)]
pub struct TokenizationOptions {
    /// Number of examples handed to the encoder per call.
    pub batch_size: usize,
}

impl Default for TokenizationOptions {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

/// An example plus its fixed-length encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedExample {
    pub text: String,
    pub label: Label,
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u8>,
}

/// Same split structure as the source dataset, every example encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedDataset {
    max_length: usize,
    splits: BTreeMap<Split, Vec<TokenizedExample>>,
}

impl TokenizedDataset {
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[must_use]
    pub fn get(&self, split: Split) -> Option<&[TokenizedExample]> {
        self.splits.get(&split).map(Vec::as_slice)
    }

    pub fn require(&self, split: Split) -> PipelineResult<&[TokenizedExample]> {
        self.get(split)
            .ok_or_else(|| PipelineError::DatasetLoad(format!("tokenized dataset has no `{split}` split")))
    }

    pub fn split_names(&self) -> impl Iterator<Item = Split> + '_ {
        self.splits.keys().copied()
    }
}

/// Pad with `pad_id` so the sequence is exactly `max_length` long.
///
/// Over-long input is cut at `max_length`; encoders are expected to have
/// truncated already so that special tokens survive.
#[must_use]
pub fn fit_to_length(mut ids: Vec<u32>, max_length: usize, pad_id: u32) -> (Vec<u32>, Vec<u8>) {
    ids.truncate(max_length);
    let real = ids.len();
    ids.resize(max_length, pad_id);
    let mut mask = vec![1u8; real];
    mask.resize(max_length, 0);
    (ids, mask)
}

pub fn tokenize_dataset(
    dataset: &DatasetDict,
    encoder: &dyn TextEncoder,
    options: &TokenizationOptions,
) -> PipelineResult<TokenizedDataset> {
    let max_length = encoder.max_length();
    let pad_id = encoder.pad_id();
    let batch_size = options.batch_size.max(1);

    let mut splits = BTreeMap::new();
    for (split, examples) in dataset.splits() {
        let mut tokenized = Vec::with_capacity(examples.len());
        for batch in examples.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|ex| ex.text.as_str()).collect();
            let encoded = encoder.encode_batch(&texts)?;
            if encoded.len() != batch.len() {
                return Err(PipelineError::Other(anyhow::anyhow!(
                    "encoder returned {} encodings for a batch of {}",
                    encoded.len(),
                    batch.len()
                )));
            }
            for (ex, ids) in batch.iter().zip(encoded) {
                let (input_ids, attention_mask) = fit_to_length(ids, max_length, pad_id);
                tokenized.push(TokenizedExample {
                    text: ex.text.clone(),
                    label: ex.label.clone(),
                    input_ids,
                    attention_mask,
                });
            }
        }
        debug!(split = %split, examples = tokenized.len(), "Tokenized split");
        splits.insert(split, tokenized);
    }

    Ok(TokenizedDataset { max_length, splits })
}
