use crate::error::{EvalResult, EvaluationError};
use reqwest::Url;
use tunesmith_training::AliasMap;

pub const DATASET_PATH: &str = "dataset-path";
pub const INFERENCE_URL: &str = "inference-url";
pub const PROXY_URL: &str = "proxy-url";
pub const SHUFFLE_SEED: &str = "shuffle-seed";

/// Settings for one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSettings {
    pub dataset_path: String,
    pub inference_url: String,
    pub proxy_url: String,
    /// Fixes the shuffle order when set.
    pub shuffle_seed: Option<u64>,
}

impl EvaluationSettings {
    pub fn from_pairs<I, K, V>(pairs: I) -> EvalResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = AliasMap::from_pairs(pairs);
        let shuffle_seed = map
            .optional(SHUFFLE_SEED)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    EvaluationError::Configuration(format!("`{SHUFFLE_SEED}` must be an unsigned integer, got `{raw}`"))
                })
            })
            .transpose()?;

        let settings = Self {
            dataset_path: map.required(DATASET_PATH)?,
            inference_url: map.required(INFERENCE_URL)?,
            proxy_url: map.required(PROXY_URL)?,
            shuffle_seed,
        };
        parse_http_url(INFERENCE_URL, &settings.inference_url)?;
        parse_http_url(PROXY_URL, &settings.proxy_url)?;
        Ok(settings)
    }
}

pub(crate) fn parse_http_url(alias: &str, raw: &str) -> EvalResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| EvaluationError::Configuration(format!("`{alias}` is not a valid URL ({raw}): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(EvaluationError::Configuration(format!(
            "`{alias}` must use http or https, got `{other}`"
        ))),
    }
}
