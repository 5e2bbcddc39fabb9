// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network, optimizer and training-loop code lives here.
//
//   model.rs      — ResNet-18/34/50/101/152, softmax
//                   cross-entropy, arg-max accuracy
//
//   schedule.rs   — tensor-free epoch bookkeeping: means,
//                   early stopping, test / save cadence
//
//   trainer.rs    — the epoch loop: train, validate, early
//                   stop, test, checkpoint
//
//   inferencer.rs — loads a checkpoint and classifies images

/// Residual network architecture
pub mod model;

/// Epoch metrics, early stopping and cadences
pub mod schedule;

/// Full training loop with validation, testing and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts classes
pub mod inferencer;
