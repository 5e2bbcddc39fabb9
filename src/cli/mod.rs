// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   — trains a ResNet on a class-per-folder image directory
//   2. `predict` — loads the latest checkpoint and classifies images

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;

/// The main CLI struct
#[derive(Parser, Debug)]
#[command(
    name = "resnet-trainer",
    version = "0.1.0",
    about = "Train a ResNet image classifier on a folder of labelled images, then classify images with it."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    /// Handles the `train` subcommand.
    /// A --config file replaces the flags entirely.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;
        use crate::ml::trainer::StopReason;

        let config = match &args.config {
            Some(path) => {
                tracing::info!("Loading training config from: {}", path.display());
                TrainConfig::load_json(path)?
            }
            None => args.into(),
        };
        tracing::info!("Starting training on images in: {}", config.data_dir);

        let use_case = TrainUseCase::new(config);
        let report   = use_case.execute()?;

        match report.stop_reason {
            StopReason::EpochLimit => println!(
                "Training complete after {} epochs ({} steps).",
                report.epochs_run, report.global_step
            ),
            StopReason::EarlyStop { epoch } => println!(
                "Training stopped early at epoch {} ({} steps).",
                epoch + 1, report.global_step
            ),
        }
        println!(
            "Test accuracy: {:.2}%  Test loss: {:.4}",
            report.final_test.accuracy * 100.0,
            report.final_test.loss
        );
        if let Some(last) = report.checkpoints.last() {
            println!("Checkpoint saved: {}", last.display());
        }
        Ok(())
    }

    /// Handles the `predict` subcommand.
    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::PredictUseCase;

        let use_case    = PredictUseCase::new(args.model_dir, args.backend);
        let predictions = use_case.execute(&args.inputs)?;

        for (path, prediction) in predictions {
            let class = prediction
                .class_name
                .unwrap_or_else(|| format!("class {}", prediction.label));
            println!(
                "{}: {} ({:.2}%)",
                path.display(),
                class,
                prediction.probability * 100.0
            );
        }
        Ok(())
    }
}
