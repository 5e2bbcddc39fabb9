// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the core
// concepts of a training run: samples, splits, the
// hyperparameter choices and the errors a bad configuration
// or a bad dataset produces.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

/// A labelled image on disk and the three-way split of a dataset
pub mod sample;

/// Network depth, optimizer, run mode and compute backend selectors
pub mod hyperparams;

/// Typed configuration and dataset errors
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
