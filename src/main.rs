//! Score Predictor - Main Entry Point

use clap::Parser;
use score_predictor::cli::{cmd_info, cmd_predict, cmd_train, Cli, Commands, TrainArgs};
use score_predictor::ingestion::StudentRecord;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { config, csv, artifact_dir, threshold, parallel, keep_going } => {
            cmd_train(&TrainArgs { config, csv, artifact_dir, threshold, parallel, keep_going })?;
        }
        Commands::Predict {
            artifact_dir,
            gender,
            race_ethnicity,
            parental_level_of_education,
            lunch,
            test_preparation_course,
            reading_score,
            writing_score,
        } => {
            let record = StudentRecord {
                gender,
                race_ethnicity,
                parental_level_of_education,
                lunch,
                test_preparation_course,
                reading_score,
                writing_score,
            }
            .normalized();
            cmd_predict(&artifact_dir, &record)?;
        }
        Commands::Info { artifact_dir } => {
            cmd_info(&artifact_dir)?;
        }
    }

    Ok(())
}
