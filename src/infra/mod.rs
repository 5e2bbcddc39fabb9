// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Run artifacts shared by the other layers:
//
//   run_name.rs   — the resnet<depth>_<optimizer>_<timestamp>
//                   stem every artifact of a run is named after
//
//   checkpoint.rs — network parameters + global step on disk,
//                   the checkpoint index, the saved config and
//                   the class names used by `predict`
//
//   metrics.rs    — the plaintext per-epoch run log and the
//                   optional per-step CSV summary

/// Artifact naming for a training run
pub mod run_name;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Run log and step summary writers
pub mod metrics;
