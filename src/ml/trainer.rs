// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One run, driven epoch by epoch:
//
//   INIT        build the ResNet; restart = fresh parameters,
//               restore = latest checkpoint (parameters + step)
//   TRAIN       one full pass of the shuffled training loader;
//               loss / accuracy = mean over the epoch's batches
//   VALIDATE    one pass of the validation loader (if any) on
//               model.valid(); accuracy = correct / samples
//   EARLY STOP  patience rule over the train and validation
//               histories; when it fires, this epoch's test /
//               save are skipped
//   TEST        every `epochs_every_test` epochs
//   SAVE        every `epochs_every_save` epochs
//   ──────────
//   final test over the whole test set, then a final save
//
// Training runs on the autodiff backend B; evaluation runs on
// B::InnerBackend so no graph is recorded. Every pass must see
// every sample of its split, otherwise the run fails.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::domain::error::ConfigError;
use crate::domain::hyperparams::{OptimizerKind, RunMode};
use crate::infra::{checkpoint::CheckpointManager, metrics::RunLog};
use crate::ml::model::{ResNet, ResNetConfig};
use crate::ml::schedule::{EpochMetrics, EpochSchedule, EvalCounter, MeanAccumulator, MetricsHistory};

/// The three datasets a run consumes.
pub struct TrainingData {
    pub train:      ImageDataset,
    pub test:       ImageDataset,
    pub validation: Option<ImageDataset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EpochLimit,
    EarlyStop { epoch: usize },
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs_run:  usize,
    pub global_step: u64,
    pub stop_reason: StopReason,
    pub history:     MetricsHistory,
    /// Periodic test results, by epoch
    pub tests:       Vec<EpochMetrics>,
    pub final_test:  EpochMetrics,
    /// Every checkpoint written, in order; the last one is the final save
    pub checkpoints: Vec<PathBuf>,
}

/// Where the trainer writes.
pub struct RunSinks<'a> {
    pub checkpoints:       &'a CheckpointManager,
    pub checkpoint_prefix: &'a str,
    pub log:               &'a mut RunLog,
}

type Loader<B> = Arc<dyn DataLoader<ImageBatch<B>>>;

/// Train a ResNet on backend `B` according to `cfg`.
pub fn run_training<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    data:   TrainingData,
    sinks:  RunSinks<'_>,
    device: B::Device,
) -> Result<TrainingReport> {
    let model: ResNet<B> = ResNetConfig::new(cfg.depth, cfg.num_classes).init(&device);
    tracing::info!(
        "Model ready: ResNet-{} with {} parameters, {} classes",
        cfg.depth, model.num_params(), cfg.num_classes
    );

    let (model, global_step) = match cfg.mode {
        RunMode::Restart => (model, 0),
        RunMode::Restore => {
            let dir = cfg
                .trained_model_dir
                .as_deref()
                .ok_or(ConfigError::MissingRestoreDir)?;
            let restored = CheckpointManager::open(dir).load_model(model, &device)?;
            sinks.log.note("Model restored...")?;
            restored
        }
    };

    let trainer = Trainer { cfg, device, sinks, global_step };

    match cfg.optimizer {
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new().init::<B, ResNet<B>>();
            trainer.fit(model, optim, data)
        }
        OptimizerKind::Momentum => {
            let momentum = cfg.momentum.ok_or(ConfigError::MissingMomentum)?;
            let optim = SgdConfig::new()
                .with_momentum(Some(MomentumConfig::new().with_momentum(momentum)))
                .init::<B, ResNet<B>>();
            trainer.fit(model, optim, data)
        }
        OptimizerKind::Adam => {
            let optim = AdamConfig::new().init::<B, ResNet<B>>();
            trainer.fit(model, optim, data)
        }
    }
}

struct Trainer<'a, B: AutodiffBackend> {
    cfg:         &'a TrainConfig,
    device:      B::Device,
    sinks:       RunSinks<'a>,
    global_step: u64,
}

impl<'a, B: AutodiffBackend> Trainer<'a, B> {
    fn fit<O>(mut self, mut model: ResNet<B>, mut optim: O, data: TrainingData) -> Result<TrainingReport>
    where
        O: Optimizer<ResNet<B>, B>,
    {
        let cfg = self.cfg;
        let n_train = data.train.sample_count();
        let n_test  = data.test.sample_count();
        let n_val   = data.validation.as_ref().map_or(0, |ds| ds.sample_count());
        self.sinks.log.note(&format!("{} training images and {} test images", n_train, n_test))?;

        let train_loader = self.train_loader(data.train);
        let test_loader  = self.eval_loader(data.test);
        let val_loader   = data.validation.map(|ds| self.eval_loader(ds));

        let schedule = EpochSchedule::new(
            cfg.early_stop_patience,
            cfg.epochs_every_test,
            cfg.epochs_every_save,
        );

        let mut history     = MetricsHistory::default();
        let mut tests       = Vec::new();
        let mut checkpoints = Vec::new();
        let mut stop_reason = StopReason::EpochLimit;
        let mut epochs_run: usize = 0;

        for epoch in 0..cfg.epochs {
            let (trained, train) = self.train_epoch(model, &mut optim, train_loader.as_ref(), epoch, n_train)?;
            model = trained;
            epochs_run += 1;
            self.sinks.log.train_epoch(&train)?;
            history.train.push(train);

            if let Some(loader) = &val_loader {
                let counter = evaluate(&model.valid(), loader.as_ref());
                ensure_full_pass("validation", counter.total(), n_val)?;
                let val = EpochMetrics::new(epoch, counter.accuracy(), counter.loss());
                self.sinks.log.validation(&val)?;
                tracing::info!(
                    "Epoch {:>3}/{} | train_loss={:.4} train_acc={:.1}% | val_loss={:.4} val_acc={:.1}%",
                    epoch + 1, cfg.epochs, train.loss, train.accuracy * 100.0,
                    val.loss, val.accuracy * 100.0,
                );
                history.validation.push(val);
            } else {
                tracing::info!(
                    "Epoch {:>3}/{} | train_loss={:.4} train_acc={:.1}%",
                    epoch + 1, cfg.epochs, train.loss, train.accuracy * 100.0,
                );
            }

            let plan = schedule.plan(epoch, &history);
            if plan.stop {
                tracing::info!(
                    "Early stop after epoch {}: {} epochs without improvement",
                    epoch + 1, cfg.early_stop_patience
                );
                stop_reason = StopReason::EarlyStop { epoch };
                break;
            }

            if plan.test {
                let counter = evaluate(&model.valid(), test_loader.as_ref());
                ensure_full_pass("test", counter.total(), n_test)?;
                let test = EpochMetrics::new(epoch, counter.accuracy(), counter.loss());
                self.sinks.log.periodic_test(&test)?;
                tracing::info!("Epoch {} test_acc={:.1}%", epoch + 1, test.accuracy * 100.0);
                tests.push(test);
            }

            if plan.save {
                checkpoints.push(self.save(&model)?);
            }
        }

        match stop_reason {
            StopReason::EpochLimit => tracing::info!("Done training -- epoch limit reached"),
            StopReason::EarlyStop { .. } => tracing::info!("Done training -- stopped early"),
        }

        let counter    = evaluate(&model.valid(), test_loader.as_ref());
        ensure_full_pass("test", counter.total(), n_test)?;
        let final_test = EpochMetrics::new(epochs_run.saturating_sub(1), counter.accuracy(), counter.loss());
        self.sinks.log.final_test(final_test.accuracy, final_test.loss)?;
        tracing::info!(
            "Test accuracy {:.2}% over {} images, loss {:.4}",
            final_test.accuracy * 100.0, counter.total(), final_test.loss
        );

        checkpoints.push(self.save(&model)?);
        self.sinks.log.flush()?;

        Ok(TrainingReport {
            epochs_run,
            global_step: self.global_step,
            stop_reason,
            history,
            tests,
            final_test,
            checkpoints,
        })
    }

    /// One pass over the training loader; returns the updated model
    /// and the per-batch means of accuracy and loss.
    fn train_epoch<O>(
        &mut self,
        mut model: ResNet<B>,
        optim:     &mut O,
        loader:    &dyn DataLoader<ImageBatch<B>>,
        epoch:     usize,
        expected:  usize,
    ) -> Result<(ResNet<B>, EpochMetrics)>
    where
        O: Optimizer<ResNet<B>, B>,
    {
        let mut accuracy = MeanAccumulator::new();
        let mut loss     = MeanAccumulator::new();
        let mut seen     = 0;

        for batch in loader.iter() {
            let output = model.forward_step(batch);

            let loss_value: f64 = output.loss.clone().into_scalar().elem::<f64>();
            let batch_acc = output.correct as f64 / output.batch_size.max(1) as f64;
            seen += output.batch_size;

            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.cfg.learning_rate, model, grads);

            self.global_step += 1;
            accuracy.add(batch_acc);
            loss.add(loss_value);
            self.sinks.log.step(self.global_step, loss_value, batch_acc)?;
        }

        ensure_full_pass("training", seen, expected)?;

        Ok((model, EpochMetrics::new(epoch, accuracy.mean(), loss.mean())))
    }

    fn save(&self, model: &ResNet<B>) -> Result<PathBuf> {
        let path = self.sinks.checkpoints.save_model(
            model,
            self.sinks.checkpoint_prefix,
            self.global_step,
        )?;
        tracing::info!("Checkpoint saved: {}", path.display());
        Ok(path)
    }

    fn train_loader(&self, dataset: ImageDataset) -> Loader<B> {
        let batcher = ImageBatcher::<B>::new(self.device.clone(), self.cfg.image_size, self.cfg.num_classes);
        DataLoaderBuilder::new(batcher)
            .batch_size(self.cfg.batch_size)
            .shuffle(self.cfg.seed)
            .num_workers(self.cfg.num_workers)
            .build(dataset)
    }

    fn eval_loader(&self, dataset: ImageDataset) -> Loader<B::InnerBackend> {
        let batcher = ImageBatcher::<B::InnerBackend>::new(
            self.device.clone(),
            self.cfg.image_size,
            self.cfg.num_classes,
        );
        DataLoaderBuilder::new(batcher)
            .batch_size(self.cfg.batch_size)
            .num_workers(self.cfg.num_workers)
            .build(dataset)
    }
}

/// One full pass over `loader` without gradients.
pub fn evaluate<B: Backend>(model: &ResNet<B>, loader: &dyn DataLoader<ImageBatch<B>>) -> EvalCounter {
    let mut counter = EvalCounter::new();
    for batch in loader.iter() {
        let output = model.forward_step(batch);
        let loss: f64 = output.loss.into_scalar().elem::<f64>();
        counter.add_batch(output.correct, output.batch_size, loss);
    }
    counter
}

/// A pass that yields fewer samples than its split holds hit an
/// unreadable image.
fn ensure_full_pass(split: &str, seen: usize, expected: usize) -> Result<()> {
    if seen != expected {
        bail!(
            "The {} pass covered {} of {} images; an image failed to load",
            split, seen, expected
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_pass_is_an_error() {
        assert!(ensure_full_pass("training", 8, 8).is_ok());

        let err = ensure_full_pass("validation", 3, 5).unwrap_err();
        assert!(err.to_string().contains("3 of 5"));
    }
}
