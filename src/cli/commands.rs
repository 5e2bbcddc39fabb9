// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// Selector flags (depth, optimizer, mode, backend) are parsed
// through the domain types' FromStr, so a bad value is rejected
// by clap before any work starts.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::hyperparams::{ComputeBackend, OptimizerKind, ResnetDepth, RunMode};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a ResNet on a class-per-folder image directory
    Train(TrainArgs),

    /// Classify images with a trained model directory
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON file holding a full training configuration; replaces every other flag
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory with one sub-directory of images per class
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Fraction of all images held out for testing
    #[arg(long, default_value_t = 0.1)]
    pub test_ratio: f64,

    /// Train without a validation split
    #[arg(long)]
    pub no_validation: bool,

    /// Fraction of the non-test images held out for validation
    #[arg(long, default_value_t = 0.1)]
    pub val_ratio: f64,

    /// Seed for the split and the per-epoch shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Images are resized to size x size
    #[arg(long, default_value_t = 224)]
    pub image_size: usize,

    /// Decode every image up front instead of on each pass
    #[arg(long)]
    pub preload: bool,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Network depth: 18, 34, 50, 101 or 152
    #[arg(long, default_value = "18")]
    pub depth: ResnetDepth,

    /// Number of output classes
    #[arg(long, default_value_t = 2)]
    pub num_classes: usize,

    /// sgd, momentum or adam
    #[arg(long, default_value = "sgd")]
    pub optimizer: OptimizerKind,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Required with --optimizer momentum
    #[arg(long)]
    pub momentum: Option<f64>,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Maximum number of epochs
    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Run the test set every N epochs (0 = only at the end)
    #[arg(long, default_value_t = 100)]
    pub epochs_every_test: usize,

    /// Save a checkpoint every N epochs (0 = only at the end)
    #[arg(long, default_value_t = 100)]
    pub epochs_every_save: usize,

    /// Stop after N epochs without improvement (0 = never)
    #[arg(long, default_value_t = 3)]
    pub early_stop_patience: usize,

    /// restart or restore
    #[arg(long, default_value = "restart")]
    pub mode: RunMode,

    /// Model directory to restore from (required with --mode restore)
    #[arg(long)]
    pub trained_model_dir: Option<String>,

    /// Where checkpoints, config and class names are written
    #[arg(long, default_value = "checkpoints")]
    pub model_dir: String,

    /// Where the run log and step summary are written
    #[arg(long, default_value = "logs")]
    pub log_dir: String,

    /// Skip the per-step CSV summary
    #[arg(long)]
    pub no_summary: bool,

    /// wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: ComputeBackend,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:    a.data_dir,
            test_ratio:  a.test_ratio,
            validation:  !a.no_validation,
            val_ratio:   a.val_ratio,
            seed:        a.seed,
            image_size:  a.image_size,
            preload:     a.preload,
            num_workers: a.num_workers,

            depth:       a.depth,
            num_classes: a.num_classes,

            optimizer:     a.optimizer,
            learning_rate: a.lr,
            momentum:      a.momentum,
            batch_size:    a.batch_size,
            epochs:        a.epochs,

            epochs_every_test:   a.epochs_every_test,
            epochs_every_save:   a.epochs_every_save,
            early_stop_patience: a.early_stop_patience,

            mode:              a.mode,
            trained_model_dir: a.trained_model_dir,
            model_dir:         a.model_dir,
            log_dir:           a.log_dir,
            summarize:         !a.no_summary,
            backend:           a.backend,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image files or directories of images
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Model directory written by `train`
    #[arg(long, default_value = "checkpoints")]
    pub model_dir: PathBuf,

    /// wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: ComputeBackend,
}
