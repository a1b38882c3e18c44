//! Evaluation command implementation.

use super::present_pairs;
use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use tunesmith_inference::settings::{DATASET_PATH, INFERENCE_URL, PROXY_URL, SHUFFLE_SEED};
use tunesmith_inference::{run_evaluation, EvaluationResult, EvaluationSettings};

#[derive(Args, Debug)]
pub struct EvaluateCommand {
    /// Dataset directory containing the test split
    #[arg(long = "dataset-path", env = "DATASET_PATH")]
    pub dataset_path: Option<String>,

    /// Inference endpoint that receives `{"data": <text>}`
    #[arg(long = "inference-url", env = "INFERENCE_URL")]
    pub inference_url: Option<String>,

    /// Forward proxy for all inference requests
    #[arg(long = "proxy-url", env = "PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Fix the shuffle order
    #[arg(long = "shuffle-seed", env = "SHUFFLE_SEED")]
    pub shuffle_seed: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvaluateCommand {
    fn setting_pairs(&self) -> Vec<(&'static str, String)> {
        present_pairs([
            (DATASET_PATH, self.dataset_path.as_ref()),
            (INFERENCE_URL, self.inference_url.as_ref()),
            (PROXY_URL, self.proxy_url.as_ref()),
            (SHUFFLE_SEED, self.shuffle_seed.as_ref()),
        ])
    }
}

pub async fn execute(command: EvaluateCommand) -> Result<()> {
    let settings = EvaluationSettings::from_pairs(command.setting_pairs())
        .context("Failed to resolve evaluation settings")?;

    let result = run_evaluation(&settings).await.context("Evaluation run failed")?;
    print_result(&result, command.json)
}

fn print_result(result: &EvaluationResult, json_output: bool) -> Result<()> {
    if json_output {
        let out = json!({
            "total_rows": result.total_rows(),
            "success_count": result.success_count(),
            "success_percentage": result.success_percentage(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match result.success_percentage() {
        Some(pct) => println!(
            "{} of {} predictions correct ({pct:.2}%)",
            result.success_count(),
            result.total_rows()
        ),
        None => println!("Test split is empty; nothing was evaluated"),
    }
    Ok(())
}
