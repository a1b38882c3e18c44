use crate::client::{HttpInferenceClient, InferenceClient};
use crate::error::EvalResult;
use crate::sampler::ShuffledExamples;
use crate::settings::EvaluationSettings;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use tunesmith_training::{load_split, Split};

/// Accuracy over a fully consumed test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    total_rows: usize,
    success_count: usize,
}

impl EvaluationResult {
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    /// `success_count * 100 / total_rows`, or `None` for an empty split.
    #[must_use]
    pub fn success_percentage(&self) -> Option<f64> {
        if self.total_rows == 0 {
            return None;
        }
        Some((self.success_count as f64 * 100.0) / self.total_rows as f64)
    }
}

/// Send every example to `client` in shuffled order and count exact label matches.
///
/// The first failed request aborts the run; no partial result is returned.
pub async fn evaluate(client: &dyn InferenceClient, examples: &ShuffledExamples) -> EvalResult<EvaluationResult> {
    let mut success_count = 0;
    for (text, expected) in examples.iter() {
        let inferred = client.infer(text).await?;
        if expected.matches(&inferred) {
            success_count += 1;
        }
        info!("Inference Result: {inferred}. Expected result: {expected}");
    }

    let result = EvaluationResult { total_rows: examples.len(), success_count };
    log_summary(&result);
    Ok(result)
}

fn log_summary(result: &EvaluationResult) {
    info!("Total rows in dataset: {}", result.total_rows);
    info!("Total number of successful predictions: {}", result.success_count);
    match result.success_percentage() {
        Some(pct) => info!("Success percentage: {pct}"),
        None => info!("Success percentage: n/a (empty test split)"),
    }
}

/// Load the test split named by `settings` and evaluate it against the proxied endpoint.
pub async fn run_evaluation(settings: &EvaluationSettings) -> EvalResult<EvaluationResult> {
    info!(path = %settings.dataset_path, "Loading test split");
    let examples = load_split(Path::new(&settings.dataset_path), Split::Test)?;
    let sequence = ShuffledExamples::new(examples, settings.shuffle_seed);

    let client = HttpInferenceClient::from_settings(settings)?;
    info!(url = %client.url(), proxy = %settings.proxy_url, rows = sequence.len(), "Starting evaluation");
    evaluate(&client, &sequence).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tunesmith_training::{Example, Label};

    /// Answers by text lookup; optionally fails on the n-th call (1-based).
    struct ScriptedClient {
        answers: HashMap<String, serde_json::Value>,
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(answers: &[(&str, serde_json::Value)]) -> Self {
            Self {
                answers: answers.iter().map(|(t, v)| ((*t).to_string(), v.clone())).collect(),
                fail_on_call: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn infer(&self, text: &str) -> EvalResult<serde_json::Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(EvaluationError::InferenceRequest("HTTP 500 Internal Server Error".to_string()));
            }
            Ok(self.answers[text].clone())
        }
    }

    fn split(labels: &[i64]) -> ShuffledExamples {
        let examples = labels
            .iter()
            .enumerate()
            .map(|(i, l)| Example { text: format!("review {i}"), label: Label::Id(*l) })
            .collect();
        ShuffledExamples::new(examples, None)
    }

    #[tokio::test]
    async fn test_three_of_four_correct_is_seventy_five_percent() {
        let client = ScriptedClient::new(&[
            ("review 0", json!(1)),
            ("review 1", json!(0)),
            ("review 2", json!(0)),
            ("review 3", json!(1)),
        ]);
        let result = evaluate(&client, &split(&[1, 0, 1, 1])).await.unwrap();

        assert_eq!(result.total_rows(), 4);
        assert_eq!(result.success_count(), 3);
        assert_eq!(result.success_percentage(), Some(75.0));
    }

    #[tokio::test]
    async fn test_failure_on_second_request_aborts_run() {
        let mut client = ScriptedClient::new(&[
            ("review 0", json!(1)),
            ("review 1", json!(0)),
            ("review 2", json!(1)),
            ("review 3", json!(1)),
        ]);
        client.fail_on_call = Some(2);

        let err = evaluate(&client, &split(&[1, 0, 1, 1])).await.unwrap_err();
        assert!(matches!(err, EvaluationError::InferenceRequest(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_string_prediction_never_matches_integer_label() {
        let client = ScriptedClient::new(&[("review 0", json!("1"))]);
        let result = evaluate(&client, &split(&[1])).await.unwrap();
        assert_eq!(result.success_count(), 0);
    }

    #[tokio::test]
    async fn test_float_prediction_matches_integer_label() {
        let client = ScriptedClient::new(&[("review 0", json!(1.0)), ("review 1", json!(0.0))]);
        let result = evaluate(&client, &split(&[1, 0])).await.unwrap();
        assert_eq!(result.success_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_split_has_no_percentage() {
        let client = ScriptedClient::new(&[]);
        let result = evaluate(&client, &split(&[])).await.unwrap();
        assert_eq!(result.total_rows(), 0);
        assert_eq!(result.success_percentage(), None);
    }

    #[test]
    fn test_percentage_formula_is_exact() {
        for (total, success) in [(3usize, 1usize), (7, 7), (9, 0), (1000, 333)] {
            let result = EvaluationResult { total_rows: total, success_count: success };
            assert_eq!(result.success_percentage(), Some(success as f64 * 100.0 / total as f64));
        }
    }
}
