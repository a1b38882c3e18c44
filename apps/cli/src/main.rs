//! Tunesmith CLI
//!
//! `tunesmith train` fine-tunes a pretrained sequence classifier and exports it in
//! native and portable form. `tunesmith evaluate` measures the accuracy of a
//! served model against a dataset's test split.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{evaluate, train};

/// Tunesmith - fine-tune and evaluate text classifiers
#[derive(Parser, Debug)]
#[command(
    name = "tunesmith",
    author,
    version,
    about = "Fine-tune a text classifier and evaluate a served model",
    long_about = "Tunesmith fine-tunes a pretrained sequence-classification model on a labeled dataset,\nexports it for serving, and evaluates a deployed inference endpoint through a forward proxy."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fine-tune a pretrained model and export it
    ///
    /// Loads the model and tokenizer from --model-path, tokenizes the dataset,
    /// runs the training engine with the hyperparameters from
    /// --training-arguments-path, and writes `trained_model/` and
    /// `trained_model_onnx/` under --output-path.
    Train(train::TrainCommand),

    /// Evaluate a served model on the test split
    ///
    /// Sends every test example to --inference-url through --proxy-url in
    /// shuffled order and reports the share of exact label matches.
    Evaluate(evaluate::EvaluateCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train(cmd) => train::execute(cmd).await,
        Command::Evaluate(cmd) => evaluate::execute(cmd).await,
    }
}
