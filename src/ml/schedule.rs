// ============================================================
// Layer 5 — Epoch Bookkeeping
// ============================================================
// The pure (tensor-free) parts of the training loop:
//
//   MeanAccumulator — arithmetic mean of per-batch values
//   EvalCounter     — correct / total over a whole evaluation pass
//   MetricsHistory  — per-epoch (accuracy, loss) records
//   EarlyStopping   — patience rule over train + validation history
//   Cadence         — "every N epochs" test / save triggers
//   EpochSchedule   — what happens after an epoch: stop, test, save

use serde::{Deserialize, Serialize};

// ─── MeanAccumulator ──────────────────────────────────────────────────────────
/// Running sum and count; the mean is NaN before the first value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAccumulator {
    sum:   f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        self.sum   += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

// ─── EvalCounter ──────────────────────────────────────────────────────────────
/// Accuracy over samples, loss averaged over batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalCounter {
    correct: usize,
    total:   usize,
    loss:    MeanAccumulator,
}

impl EvalCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_batch(&mut self, correct: usize, batch_size: usize, loss: f64) {
        self.correct += correct;
        self.total   += batch_size;
        self.loss.add(loss);
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn loss(&self) -> f64 {
        self.loss.mean()
    }
}

// ─── MetricsHistory ───────────────────────────────────────────────────────────
/// One row of metrics for a single epoch (epoch counts from 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:    usize,
    pub accuracy: f64,
    pub loss:     f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, accuracy: f64, loss: f64) -> Self {
        Self { epoch, accuracy, loss }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsHistory {
    pub train:      Vec<EpochMetrics>,
    pub validation: Vec<EpochMetrics>,
}

impl MetricsHistory {
    /// Trailing epochs in which neither history improved
    pub fn stale_epochs(&self) -> usize {
        let train = EarlyStopping::stale_epochs(&self.train);
        if self.validation.is_empty() {
            train
        } else {
            train.min(EarlyStopping::stale_epochs(&self.validation))
        }
    }
}

// ─── EarlyStopping ────────────────────────────────────────────────────────────
/// Stops once `patience` consecutive epochs fail to improve.
///
/// Within one history an epoch improves when its accuracy beats the
/// best accuracy so far or its loss is below the best loss so far.
/// An epoch of a run counts as improving when either its training or
/// its validation metrics improved. A patience of 0 never stops.
#[derive(Debug, Clone, Copy)]
pub struct EarlyStopping {
    patience: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience }
    }

    /// Consecutive non-improving epochs at the end of `history`
    pub fn stale_epochs(history: &[EpochMetrics]) -> usize {
        let mut best_accuracy = f64::NEG_INFINITY;
        let mut best_loss     = f64::INFINITY;
        let mut stale         = 0;

        for m in history {
            if m.accuracy > best_accuracy || m.loss < best_loss {
                stale = 0;
            } else {
                stale += 1;
            }
            best_accuracy = best_accuracy.max(m.accuracy);
            best_loss     = best_loss.min(m.loss);
        }
        stale
    }

    pub fn should_stop(&self, history: &MetricsHistory) -> bool {
        self.patience > 0 && history.stale_epochs() >= self.patience
    }
}

// ─── Cadence ──────────────────────────────────────────────────────────────────
/// Fires after every `every`-th epoch; 0 never fires.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    every: usize,
}

impl Cadence {
    pub fn new(every: usize) -> Self {
        Self { every }
    }

    /// `epoch` counts from 0, so epoch 9 is the 10th epoch
    pub fn is_due(&self, epoch: usize) -> bool {
        self.every > 0 && (epoch + 1) % self.every == 0
    }
}

// ─── EpochSchedule ────────────────────────────────────────────────────────────
/// What the loop does once an epoch's metrics are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochPlan {
    pub stop: bool,
    pub test: bool,
    pub save: bool,
}

/// Early stopping plus the test and save cadences.
#[derive(Debug, Clone, Copy)]
pub struct EpochSchedule {
    pub early_stop: EarlyStopping,
    pub test_every: Cadence,
    pub save_every: Cadence,
}

impl EpochSchedule {
    pub fn new(patience: usize, test_every: usize, save_every: usize) -> Self {
        Self {
            early_stop: EarlyStopping::new(patience),
            test_every: Cadence::new(test_every),
            save_every: Cadence::new(save_every),
        }
    }

    /// A stopping epoch skips its periodic test and save.
    pub fn plan(&self, epoch: usize, history: &MetricsHistory) -> EpochPlan {
        if self.early_stop.should_stop(history) {
            return EpochPlan { stop: true, test: false, save: false };
        }
        EpochPlan {
            stop: false,
            test: self.test_every.is_due(epoch),
            save: self.save_every.is_due(epoch),
        }
    }
}
