use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use classifier::{
    training::{self, DEFAULT_SEED},
    NaiveBayesModel, TicketTable,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the ticket model from a CSV with `text` and `category` columns.
    Train {
        #[arg(long, default_value = "tickets.csv")]
        data: PathBuf,
        #[arg(long, default_value = "model/classifier.json")]
        model_path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Score a saved model against a labelled CSV.
    Evaluate {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "model/classifier.json")]
        model_path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            data,
            model_path,
            seed,
        } => {
            let samples = TicketTable::from_path(&data)
                .and_then(|table| table.labeled())
                .with_context(|| format!("failed to load training data '{}'", data.display()))?;
            let outcome = training::train(&samples, seed)?;
            println!("Accuracy: {}", outcome.report.accuracy);
            println!("\nClassification Report:\n{}", outcome.report);
            outcome
                .model
                .save(&model_path)
                .with_context(|| format!("failed to save model '{}'", model_path.display()))?;
            info!(path = %model_path.display(), "model saved");
            println!("Model saved to {}", model_path.display());
        }
        Command::Evaluate { data, model_path } => {
            let model = NaiveBayesModel::load(&model_path)?;
            let samples = TicketTable::from_path(&data)
                .and_then(|table| table.labeled())
                .with_context(|| format!("failed to load evaluation data '{}'", data.display()))?;
            let report = training::evaluate(&model, &samples);
            println!("Accuracy: {}", report.accuracy);
            println!("\nClassification Report:\n{report}");
        }
    }

    Ok(())
}
