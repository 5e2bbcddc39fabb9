// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a class-per-folder image directory to
// device-ready tensor batches:
//
//   image directory
//       │
//       ▼
//   ImageFolderLoader   → lists (path, label) samples
//       │
//       ▼
//   data_split          → shuffles, cuts train / test / validation
//       │
//       ▼
//   ImageDataset        → Burn Dataset, decodes via ImagePreprocessor
//       │
//       ▼
//   ImageBatcher        → stacks images, one-hot labels, targets
//       │
//       ▼
//   DataLoader          → one finite pass per iter() call

/// Lists labelled images from a class-per-folder directory
pub mod loader;

/// Decodes, resizes and normalises an image file
pub mod preprocessor;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits samples into train/test/validation sets
pub mod splitter;
