//! Inference endpoint client.
//!
//! Requests are `POST {"data": <text>}` to the inference URL, routed through the
//! configured forward proxy. The response body's top-level JSON value is the
//! predicted label.

use crate::error::{EvalResult, EvaluationError};
use crate::settings::{parse_http_url, EvaluationSettings, INFERENCE_URL, PROXY_URL};
use async_trait::async_trait;
use reqwest::{Client, Proxy, Url};
use serde::Serialize;
use tracing::{debug, error};

/// Sends one example's text to a served model and returns the decoded prediction.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, text: &str) -> EvalResult<serde_json::Value>;
}

#[derive(Serialize)]
struct InferenceRequestBody<'a> {
    data: &'a str,
}

/// HTTP inference client with a single forward proxy for both http and https.
///
/// No request timeout is set.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    url: Url,
    client: Client,
}

impl HttpInferenceClient {
    pub fn new(inference_url: &str, proxy_url: &str) -> EvalResult<Self> {
        let url = parse_http_url(INFERENCE_URL, inference_url)?;
        parse_http_url(PROXY_URL, proxy_url)?;

        let proxy = Proxy::all(proxy_url)
            .map_err(|e| EvaluationError::Configuration(format!("invalid proxy `{proxy_url}`: {e}")))?;
        // An explicit proxy replaces any proxy picked up from the environment.
        let client = Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| EvaluationError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { url, client })
    }

    pub fn from_settings(settings: &EvaluationSettings) -> EvalResult<Self> {
        Self::new(&settings.inference_url, &settings.proxy_url)
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn infer(&self, text: &str) -> EvalResult<serde_json::Value> {
        debug!(url = %self.url, text_len = text.len(), "Sending inference request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&InferenceRequestBody { data: text })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %self.url, "Inference request failed");
                EvaluationError::InferenceRequest(format!("network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, body = %body, "Inference endpoint returned error status");
            return Err(EvaluationError::InferenceRequest(format!("HTTP {status}: {body}")));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            error!(error = %e, "Failed to decode inference response");
            EvaluationError::InferenceRequest(format!("failed to decode response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    // The inference host does not resolve; requests only succeed when they go
    // through the mock server acting as the forward proxy.
    const INFERENCE: &str = "http://inference.invalid/predict";

    #[tokio::test]
    async fn test_infer_routes_through_proxy() {
        let mut proxy = mockito::Server::new_async().await;
        let mock = proxy
            .mock("POST", "/predict")
            .match_body(Matcher::Json(json!({"data": "what a film"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("1")
            .create_async()
            .await;

        let client = HttpInferenceClient::new(INFERENCE, &proxy.url()).unwrap();
        let label = client.infer("what a film").await.unwrap();

        assert_eq!(label, json!(1));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_infer_decodes_string_labels() {
        let mut proxy = mockito::Server::new_async().await;
        let _mock = proxy
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(r#""POSITIVE""#)
            .create_async()
            .await;

        let client = HttpInferenceClient::new(INFERENCE, &proxy.url()).unwrap();
        assert_eq!(client.infer("x").await.unwrap(), json!("POSITIVE"));
    }

    #[tokio::test]
    async fn test_error_status_is_inference_error() {
        let mut proxy = mockito::Server::new_async().await;
        let _mock = proxy
            .mock("POST", "/predict")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;

        let client = HttpInferenceClient::new(INFERENCE, &proxy.url()).unwrap();
        let err = client.infer("x").await.unwrap_err();
        assert!(matches!(err, EvaluationError::InferenceRequest(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_inference_error() {
        let mut proxy = mockito::Server::new_async().await;
        let _mock = proxy.mock("POST", "/predict").with_status(200).with_body("<html>").create_async().await;

        let client = HttpInferenceClient::new(INFERENCE, &proxy.url()).unwrap();
        assert!(matches!(client.infer("x").await, Err(EvaluationError::InferenceRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_inference_error() {
        let client = HttpInferenceClient::new(INFERENCE, "http://127.0.0.1:9").unwrap();
        assert!(matches!(client.infer("x").await, Err(EvaluationError::InferenceRequest(_))));
    }

    #[test]
    fn test_invalid_urls_are_configuration_errors() {
        assert!(matches!(
            HttpInferenceClient::new("inference", "http://proxy:3128"),
            Err(EvaluationError::Configuration(_))
        ));
        assert!(matches!(
            HttpInferenceClient::new(INFERENCE, "::"),
            Err(EvaluationError::Configuration(_))
        ));
    }
}
