// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to the data and ML layers
// through these traits, never through their concrete types:
//   - ImageFolderLoader implements SampleSource
//   - Inferencer implements ImageClassifier

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::sample::{ClassIndex, Sample};

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can list labelled samples.
pub trait SampleSource {
    /// List every sample together with the class names its labels refer to.
    fn load_all(&self) -> Result<(ClassIndex, Vec<Sample>)>;
}

// ─── ImageClassifier ──────────────────────────────────────────────────────────
/// The outcome of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label:         usize,
    pub class_name:    Option<String>,
    pub probability:   f32,
    pub probabilities: Vec<f32>,
}

/// Any component that can assign a class to an image file.
pub trait ImageClassifier {
    fn classify(&self, path: &Path) -> Result<Prediction>;
}
