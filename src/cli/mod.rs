//! Score Predictor CLI Module
//!
//! Command-line interface for training, prediction and artifact inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::export::ArtifactStore;
use crate::inference::InferenceEngine;
use crate::ingestion::{CsvSource, StudentRecord};
use crate::pipeline::{PipelineConfig, TrainingOutcome, TrainingPipeline};
use crate::training::{EvaluationMode, FailurePolicy};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "score-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve a student math-score regression model")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train every candidate model and keep the best
    Train {
        /// TOML configuration file (defaults plus SCORE_* variables otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Read the dataset from a CSV file instead of MySQL
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Artifact output directory
        #[arg(short, long)]
        artifact_dir: Option<PathBuf>,

        /// Minimum held-out R² of the winner
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Evaluate candidates on the rayon pool
        #[arg(long)]
        parallel: bool,

        /// Record failing models and keep evaluating the rest
        #[arg(long)]
        keep_going: bool,
    },

    /// Predict the math score of one student
    Predict {
        /// Artifact directory written by `train`
        #[arg(short, long, env = "SCORE_ARTIFACT_DIR", default_value = "artifact")]
        artifact_dir: PathBuf,

        #[arg(long)]
        gender: String,

        #[arg(long)]
        race_ethnicity: String,

        #[arg(long)]
        parental_level_of_education: String,

        #[arg(long)]
        lunch: String,

        #[arg(long)]
        test_preparation_course: String,

        #[arg(long)]
        reading_score: f64,

        #[arg(long)]
        writing_score: f64,
    },

    /// Show the persisted model and its score report
    Info {
        #[arg(short, long, env = "SCORE_ARTIFACT_DIR", default_value = "artifact")]
        artifact_dir: PathBuf,
    },
}

/// Options of the `train` subcommand
#[derive(Debug, Clone, Default)]
pub struct TrainArgs {
    pub config: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub artifact_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub parallel: bool,
    pub keep_going: bool,
}

impl TrainArgs {
    /// Resolve the run configuration: file or environment, then flags
    pub fn resolve(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::from_env()?,
        };
        if let Some(dir) = &self.artifact_dir {
            config = config.with_artifact_dir(dir);
        }
        if let Some(threshold) = self.threshold {
            config = config.with_threshold(threshold);
        }
        if self.parallel {
            config = config.with_evaluation_mode(EvaluationMode::Parallel);
        }
        if self.keep_going {
            config = config.with_failure_policy(FailurePolicy::Continue);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");

    let config = args.resolve()?;
    let pipeline = match &args.csv {
        Some(path) => TrainingPipeline::new(config, CsvSource::new(path)),
        None => mysql_pipeline(config)?,
    };

    step_run("Training candidate models");
    let start = Instant::now();
    let outcome = pipeline.run()?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&outcome);
    Ok(())
}

#[cfg(feature = "mysql")]
fn mysql_pipeline(config: PipelineConfig) -> anyhow::Result<TrainingPipeline> {
    let source = crate::ingestion::MySqlSource::new(config.database.clone());
    Ok(TrainingPipeline::new(config, source))
}

#[cfg(not(feature = "mysql"))]
fn mysql_pipeline(_config: PipelineConfig) -> anyhow::Result<TrainingPipeline> {
    anyhow::bail!("built without MySQL support; pass --csv FILE")
}

fn print_report(outcome: &TrainingOutcome) {
    println!();
    println!(
        "  {:<22} {:>9} {:>9} {:>9} {:>9}",
        muted("Model"),
        muted("R²"),
        muted("MAE"),
        muted("RMSE"),
        muted("Fit")
    );
    println!("  {}", dim(&"─".repeat(62)));

    for score in outcome.report.scores() {
        let line = format!(
            "{:<22} {:>9.4} {:>9.3} {:>9.3} {:>8.2}s",
            score.name, score.r2, score.mae, score.rmse, score.fit_secs
        );
        if score.name == outcome.model_name {
            println!("  {}", line.white().bold());
        } else {
            println!("  {}", line);
        }
    }
    for failure in outcome.report.failures() {
        println!("  {:<22} {}", failure.name, format!("err: {}", failure.error).red());
    }
    println!("  {}", dim(&"─".repeat(62)));

    println!();
    println!(
        "  {} {} {} {:.4}",
        ok("best"),
        outcome.model_name.white().bold(),
        muted("R²:"),
        outcome.score
    );
    println!("  {:<10} {}", muted("Saved"), outcome.paths.dir.display());
    println!();
}

pub fn cmd_predict(artifact_dir: &Path, record: &StudentRecord) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading artifacts");
    let engine = InferenceEngine::load(artifact_dir)?;
    step_done(engine.model_name());

    let predicted = engine.predict_record(record)?;
    println!();
    println!("  {:<16} {}", muted("Math score"), format!("{:.2}", predicted).white().bold());
    println!();
    Ok(())
}

pub fn cmd_info(artifact_dir: &Path) -> anyhow::Result<()> {
    section("Model Info");

    let store = ArtifactStore::new(artifact_dir);
    let artifact = store.load_model()?;
    let transformer = store.load_transformer()?;

    println!("  {:<14} {}", muted("Directory"), artifact_dir.display());
    println!("  {:<14} {}", muted("Model"), artifact.name.white().bold());
    println!("  {:<14} {}", muted("Algorithm"), artifact.algorithm);
    println!("  {:<14} {:.4}", muted("R²"), artifact.score);
    println!("  {:<14} {}", muted("Trained"), artifact.trained_at.to_rfc3339());
    println!("  {:<14} {}", muted("Features"), transformer.output_width());
    println!();

    println!("  {:<22} {:>9}", muted("Candidate"), muted("R²"));
    println!("  {}", dim(&"─".repeat(32)));
    for score in artifact.report.scores() {
        println!("  {:<22} {:>9.4}", score.name, score.r2);
    }
    for failure in artifact.report.failures() {
        println!("  {:<22} {:>9}", failure.name, "failed".red());
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_train_flags() {
        let cli = Cli::try_parse_from([
            "score-predictor",
            "train",
            "--csv",
            "stud.csv",
            "--threshold",
            "0.7",
            "--parallel",
            "--keep-going",
        ])
        .unwrap();
        match cli.command {
            Commands::Train { csv, threshold, parallel, keep_going, .. } => {
                assert_eq!(csv, Some(PathBuf::from("stud.csv")));
                assert_eq!(threshold, Some(0.7));
                assert!(parallel);
                assert!(keep_going);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::try_parse_from([
            "score-predictor",
            "predict",
            "--artifact-dir",
            "out",
            "--gender",
            "female",
            "--race-ethnicity",
            "group B",
            "--parental-level-of-education",
            "master's degree",
            "--lunch",
            "standard",
            "--test-preparation-course",
            "none",
            "--reading-score",
            "72",
            "--writing-score",
            "74",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Predict { reading_score, .. } if reading_score == 72.0));
    }

    #[test]
    fn test_train_args_apply_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "threshold = 0.5\n").unwrap();

        let args = TrainArgs {
            config: Some(path),
            threshold: Some(0.65),
            parallel: true,
            keep_going: true,
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.threshold, 0.65);
        assert_eq!(config.evaluation_mode, EvaluationMode::Parallel);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }
}
