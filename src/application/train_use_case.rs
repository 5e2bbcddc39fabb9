// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration          (Layer 3 - domain)
//   Step 2: Name the run                        (Layer 6 - infra)
//   Step 3: List and split the images           (Layer 4 - data)
//   Step 4: Save config + class names           (Layer 6 - infra)
//   Step 5: Build datasets                      (Layer 4 - data)
//   Step 6: Open the run log                    (Layer 6 - infra)
//   Step 7: Run the training loop on a backend  (Layer 5 - ml)

use std::path::Path;

use anyhow::Result;
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::ImageDataset,
    loader::ImageFolderLoader,
    preprocessor::ImagePreprocessor,
    splitter::{data_split, SplitRatios},
};
use crate::domain::error::{ConfigError, DataError};
use crate::domain::hyperparams::{ComputeBackend, OptimizerKind, ResnetDepth, RunMode};
use crate::domain::sample::Sample;
use crate::infra::{checkpoint::CheckpointManager, metrics::RunLog, run_name::RunName};
use crate::ml::trainer::{run_training, RunSinks, StopReason, TrainingData, TrainingReport};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a run, fixed before the run starts.
// Serialisable so it is saved next to the checkpoints and the
// predictor can rebuild the same network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    // data
    pub data_dir:    String,
    pub test_ratio:  f64,
    pub validation:  bool,
    pub val_ratio:   f64,
    pub seed:        u64,
    pub image_size:  usize,
    pub preload:     bool,
    pub num_workers: usize,

    // network
    pub depth:       ResnetDepth,
    pub num_classes: usize,

    // optimisation
    pub optimizer:     OptimizerKind,
    pub learning_rate: f64,
    pub momentum:      Option<f64>,
    pub batch_size:    usize,
    pub epochs:        usize,

    // cadences
    pub epochs_every_test:   usize,
    pub epochs_every_save:   usize,
    pub early_stop_patience: usize,

    // run
    pub mode:              RunMode,
    pub trained_model_dir: Option<String>,
    pub model_dir:         String,
    pub log_dir:           String,
    pub summarize:         bool,
    pub backend:           ComputeBackend,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:    "data".to_string(),
            test_ratio:  0.1,
            validation:  true,
            val_ratio:   0.1,
            seed:        42,
            image_size:  224,
            preload:     false,
            num_workers: 1,

            depth:       ResnetDepth::D18,
            num_classes: 2,

            optimizer:     OptimizerKind::Sgd,
            learning_rate: 1e-4,
            momentum:      None,
            batch_size:    32,
            epochs:        500,

            epochs_every_test:   100,
            epochs_every_save:   100,
            early_stop_patience: 3,

            mode:              RunMode::Restart,
            trained_model_dir: None,
            model_dir:         "checkpoints".to_string(),
            log_dir:           "logs".to_string(),
            summarize:         true,
            backend:           ComputeBackend::Wgpu,
        }
    }
}

impl TrainConfig {
    pub fn split_ratios(&self) -> SplitRatios {
        SplitRatios {
            test_ratio: self.test_ratio,
            validation: self.validation,
            val_ratio:  self.val_ratio,
        }
    }

    /// Reject configurations a run cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.split_ratios().validate()?;

        for (name, value) in [
            ("batch size", self.batch_size),
            ("epochs", self.epochs),
            ("class count", self.num_classes),
            ("image size", self.image_size),
            ("worker count", self.num_workers),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        if self.optimizer == OptimizerKind::Momentum && self.momentum.is_none() {
            return Err(ConfigError::MissingMomentum);
        }
        if self.mode == RunMode::Restore && self.trained_model_dir.is_none() {
            return Err(ConfigError::MissingRestoreDir);
        }
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        use anyhow::Context;
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Name the run ──────────────────────────────────────────────
        let run_name = RunName::now(cfg.depth, cfg.optimizer);
        tracing::info!("Run '{}' ({} mode, {} backend)", run_name.stem(), cfg.mode, cfg.backend);

        // ── Step 3: List and split the images ─────────────────────────────────
        let loader = ImageFolderLoader::new(&cfg.data_dir);
        let (classes, split) = data_split(&loader, &cfg.split_ratios(), cfg.seed)?;
        if classes.len() > cfg.num_classes {
            return Err(DataError::TooManyClasses {
                found:    classes.len(),
                expected: cfg.num_classes,
            }
            .into());
        }
        if classes.len() < cfg.num_classes {
            tracing::warn!(
                "Found {} class folders but the network has {} outputs",
                classes.len(),
                cfg.num_classes
            );
        }
        tracing::info!(
            "Split: {} train, {} test, {} validation",
            split.train.len(),
            split.test.len(),
            split.validation.len()
        );
        if let Some(part) = split.empty_part(cfg.validation) {
            return Err(DataError::EmptySplit { split: part }.into());
        }

        // ── Step 4: Save config + class names ─────────────────────────────────
        let checkpoints = CheckpointManager::create(&cfg.model_dir)?;
        checkpoints.save_config(cfg)?;
        checkpoints.save_classes(&classes)?;

        // ── Step 5: Build datasets ────────────────────────────────────────────
        let preprocessor = ImagePreprocessor::new(cfg.image_size);
        let data = TrainingData {
            train:      self.dataset(split.train, preprocessor)?,
            test:       self.dataset(split.test, preprocessor)?,
            validation: if cfg.validation {
                Some(self.dataset(split.validation, preprocessor)?)
            } else {
                None
            },
        };

        // ── Step 6: Open the run log ──────────────────────────────────────────
        let summary_file = cfg.summarize.then(|| run_name.summary_filename());
        let mut log = RunLog::create(
            Path::new(&cfg.log_dir),
            &run_name.log_filename(),
            summary_file.as_deref(),
        )?;

        // ── Step 7: Train ─────────────────────────────────────────────────────
        let prefix = run_name.checkpoint_prefix();
        let sinks  = RunSinks {
            checkpoints:       &checkpoints,
            checkpoint_prefix: &prefix,
            log:               &mut log,
        };
        let report = match cfg.backend {
            ComputeBackend::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                run_training::<Autodiff<Wgpu>>(cfg, data, sinks, device)?
            }
            ComputeBackend::NdArray => {
                run_training::<Autodiff<NdArray>>(cfg, data, sinks, NdArrayDevice::default())?
            }
        };

        match report.stop_reason {
            StopReason::EpochLimit => tracing::info!(
                "Trained {} epochs ({} steps)", report.epochs_run, report.global_step
            ),
            StopReason::EarlyStop { epoch } => tracing::info!(
                "Stopped early at epoch {} ({} steps)", epoch + 1, report.global_step
            ),
        }
        tracing::info!("Log written to '{}'", log.log_path().display());

        Ok(report)
    }

    fn dataset(&self, samples: Vec<Sample>, preprocessor: ImagePreprocessor) -> Result<ImageDataset> {
        if self.config.preload {
            ImageDataset::preload(samples, preprocessor)
        } else {
            let dataset = ImageDataset::new(samples, preprocessor);
            dataset.verify()?;
            Ok(dataset)
        }
    }
}
