// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Classifies image files with a trained run:
//   1. Expand directory inputs into their image files
//   2. Rebuild the network from the model directory
//   3. Classify every image, in input order

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu};
use burn::prelude::Backend;
use walkdir::WalkDir;

use crate::data::loader::is_image_file;
use crate::domain::hyperparams::ComputeBackend;
use crate::domain::traits::{ImageClassifier, Prediction};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    model_dir: PathBuf,
    backend:   ComputeBackend,
}

impl PredictUseCase {
    pub fn new(model_dir: impl Into<PathBuf>, backend: ComputeBackend) -> Self {
        Self { model_dir: model_dir.into(), backend }
    }

    /// Classify every image named by `inputs` (files or directories)
    pub fn execute(&self, inputs: &[PathBuf]) -> Result<Vec<(PathBuf, Prediction)>> {
        let images = expand_inputs(inputs)?;
        if images.is_empty() {
            bail!("No image files found in the given inputs");
        }
        tracing::info!("Classifying {} image(s) with model in '{}'", images.len(), self.model_dir.display());

        match self.backend {
            ComputeBackend::Wgpu    => self.classify_all::<Wgpu>(&images, WgpuDevice::default()),
            ComputeBackend::NdArray => self.classify_all::<NdArray>(&images, NdArrayDevice::default()),
        }
    }

    fn classify_all<B: Backend>(&self, images: &[PathBuf], device: B::Device) -> Result<Vec<(PathBuf, Prediction)>> {
        let ckpt       = CheckpointManager::open(&self.model_dir);
        let inferencer = Inferencer::<B>::from_checkpoint(&ckpt, device)?;

        images
            .iter()
            .map(|path| {
                let prediction = inferencer
                    .classify(path)
                    .with_context(|| format!("Failed to classify '{}'", path.display()))?;
                Ok((path.clone(), prediction))
            })
            .collect()
    }
}

/// Files pass through as given; directories contribute their image
/// files, sorted, at any depth.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_image_file(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            tracing::debug!("{} image(s) under '{}'", found.len(), input.display());
            images.extend(found);
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            bail!("Input '{}' does not exist", input.display());
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_expand_inputs_walks_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(nested.join("z.png")).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(dir.path().join("a/y.PNG")).unwrap();
        fs::write(dir.path().join("a/notes.txt"), "skip").unwrap();

        let single = dir.path().join("a/y.PNG");
        let images = expand_inputs(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(images, vec![nested.join("z.png"), single.clone(), single]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(expand_inputs(&[dir.path().join("missing.png")]).is_err());
    }

    #[test]
    fn test_no_images_is_an_error() {
        let dir = TempDir::new().unwrap();
        let use_case = PredictUseCase::new(dir.path(), ComputeBackend::NdArray);
        assert!(use_case.execute(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_untrained_model_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("x.png");
        RgbImage::from_pixel(4, 4, Rgb([9, 9, 9])).save(&image).unwrap();

        let use_case = PredictUseCase::new(dir.path().join("models"), ComputeBackend::NdArray);
        assert!(use_case.execute(&[image]).is_err());
    }
}
