//! Integration tests for the `tunesmith evaluate` command.

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const INFERENCE: &str = "http://inference.invalid/predict";

fn tunesmith() -> Command {
    let mut cmd = Command::cargo_bin("tunesmith").unwrap();
    for var in ["DATASET_PATH", "INFERENCE_URL", "PROXY_URL", "SHUFFLE_SEED", "HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY"] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_test_split(dir: &Path) {
    let rows = [("loved it", 1), ("hated it", 0), ("fine i guess", 1), ("superb", 1)];
    let body: String = rows.iter().map(|(t, l)| format!("{}\n", json!({"text": t, "label": l}))).collect();
    std::fs::write(dir.join("test.jsonl"), body).unwrap();
}

#[test]
fn test_evaluate_reports_accuracy_through_proxy() {
    let temp = TempDir::new().unwrap();
    write_test_split(temp.path());

    let mut proxy = mockito::Server::new();
    let mocks: Vec<_> = [("loved it", "1"), ("hated it", "0"), ("fine i guess", "0"), ("superb", "1")]
        .into_iter()
        .map(|(text, answer)| {
            proxy
                .mock("POST", "/predict")
                .match_body(Matcher::Json(json!({"data": text})))
                .with_status(200)
                .with_body(answer)
                .expect(1)
                .create()
        })
        .collect();

    tunesmith()
        .arg("evaluate")
        .arg("--dataset-path")
        .arg(temp.path())
        .args(["--inference-url", INFERENCE, "--proxy-url", &proxy.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 4 predictions correct (75.00%)"));

    for mock in mocks {
        mock.assert();
    }
}

#[test]
fn test_evaluate_json_output() {
    let temp = TempDir::new().unwrap();
    write_test_split(temp.path());

    let mut proxy = mockito::Server::new();
    let _mock = proxy.mock("POST", "/predict").with_status(200).with_body("1").expect(4).create();

    let output = tunesmith()
        .arg("evaluate")
        .arg("--json")
        .env("DATASET_PATH", temp.path())
        .env("INFERENCE_URL", INFERENCE)
        .env("PROXY_URL", proxy.url())
        .env("SHUFFLE_SEED", "7")
        .arg("--log-level")
        .arg("error")
        .output()
        .unwrap();

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["total_rows"], 4);
    assert_eq!(result["success_count"], 3);
    assert_eq!(result["success_percentage"], 75.0);
}

#[test]
fn test_evaluate_missing_proxy_fails() {
    let temp = TempDir::new().unwrap();
    write_test_split(temp.path());

    tunesmith()
        .arg("evaluate")
        .arg("--dataset-path")
        .arg(temp.path())
        .args(["--inference-url", INFERENCE])
        .assert()
        .failure()
        .stderr(predicate::str::contains("proxy-url"));
}

#[test]
fn test_evaluate_server_error_aborts() {
    let temp = TempDir::new().unwrap();
    write_test_split(temp.path());

    let mut proxy = mockito::Server::new();
    let _mock = proxy.mock("POST", "/predict").with_status(500).with_body("boom").create();

    tunesmith()
        .arg("evaluate")
        .arg("--dataset-path")
        .arg(temp.path())
        .args(["--inference-url", INFERENCE, "--proxy-url", &proxy.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inference request failed"))
        .stdout(predicate::str::contains("predictions correct").not());
}
