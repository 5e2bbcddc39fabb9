// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the network a run trained (from train_config.json),
// loads its latest checkpoint, and classifies image files with
// the same preprocessing the run used.

use std::path::Path;

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::data::preprocessor::{ImagePreprocessor, CHANNELS};
use crate::domain::sample::ClassIndex;
use crate::domain::traits::{ImageClassifier, Prediction};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{ResNet, ResNetConfig};

pub struct Inferencer<B: Backend> {
    model:        ResNet<B>,
    preprocessor: ImagePreprocessor,
    classes:      ClassIndex,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: ResNet<B>, preprocessor: ImagePreprocessor, classes: ClassIndex, device: B::Device) -> Self {
        Self { model, preprocessor, classes, device }
    }

    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg     = ckpt.load_config()?;
        let classes = ckpt.load_classes().unwrap_or_else(|e| {
            tracing::warn!("No class names available ({:#}), reporting labels only", e);
            ClassIndex::default()
        });

        let model: ResNet<B> = ResNetConfig::new(cfg.depth, cfg.num_classes).init(&device);
        let (model, step)    = ckpt.load_model(model, &device)?;
        tracing::info!("ResNet-{} loaded from step {}", cfg.depth, step);

        Ok(Self::new(model, ImagePreprocessor::new(cfg.image_size), classes, device))
    }

    /// Classify an already preprocessed CHW buffer
    pub fn classify_pixels(&self, pixels: Vec<f32>) -> Result<Prediction> {
        let size = self.preprocessor.image_size();
        anyhow::ensure!(
            pixels.len() == self.preprocessor.pixel_count(),
            "expected {} pixel values, got {}",
            self.preprocessor.pixel_count(),
            pixels.len()
        );

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [1, CHANNELS, size, size]),
            &self.device,
        );
        let probabilities: Vec<f32> = self
            .model
            .probabilities(images)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {:?}", e))?;

        let (label, probability) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        Ok(Prediction {
            label,
            class_name: self.classes.name(label).map(str::to_string),
            probability,
            probabilities,
        })
    }
}

impl<B: Backend> ImageClassifier for Inferencer<B> {
    fn classify(&self, path: &Path) -> Result<Prediction> {
        let pixels = self
            .preprocessor
            .load(path)
            .with_context(|| format!("Cannot classify '{}'", path.display()))?;
        self.classify_pixels(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hyperparams::ResnetDepth;
    use burn::backend::NdArray;

    #[test]
    fn test_prediction_is_argmax_of_probabilities() {
        let device = Default::default();
        let model: ResNet<NdArray> = ResNetConfig::new(ResnetDepth::D18, 3).init(&device);
        let classes = ClassIndex::new(vec!["a".into(), "b".into(), "c".into()]);
        let inferencer = Inferencer::new(model, ImagePreprocessor::new(16), classes, device);

        let p = inferencer.classify_pixels(vec![0.5; 3 * 16 * 16]).unwrap();
        assert_eq!(p.probabilities.len(), 3);
        let max = p.probabilities.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(p.probability, max);
        assert_eq!(p.class_name.as_deref(), Some(["a", "b", "c"][p.label]));
    }

    #[test]
    fn test_rejects_wrong_buffer_size() {
        let device = Default::default();
        let model: ResNet<NdArray> = ResNetConfig::new(ResnetDepth::D18, 2).init(&device);
        let inferencer = Inferencer::new(model, ImagePreprocessor::new(8), ClassIndex::default(), device);
        assert!(inferencer.classify_pixels(vec![0.0; 10]).is_err());
    }
}
