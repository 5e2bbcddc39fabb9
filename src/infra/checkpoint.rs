// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores network parameters with Burn's named
// MessagePack recorder (full precision).
//
// Directory layout:
//   checkpoints/
//     resnet18_sgd_<ts>.ckpt-120   ← parameters after step 120
//     resnet18_sgd_<ts>.ckpt-240   ← parameters after step 240
//     checkpoint.json              ← latest file name + global step
//     train_config.json            ← network / run configuration
//     classes.json                 ← class names in label order
//
// The recorder writes to bytes and the bytes are written under
// the exact checkpoint name, so the step suffix survives.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::sample::ClassIndex;
use crate::ml::model::ResNet;

const INDEX_FILE:   &str = "checkpoint.json";
const CONFIG_FILE:  &str = "train_config.json";
const CLASSES_FILE: &str = "classes.json";

/// Contents of checkpoint.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointIndex {
    pub latest:      String,
    pub global_step: u64,
    pub saved_at:    String,
}

type ParamRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Manages saving and loading of checkpoints in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Use `dir` for checkpoints, creating it if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Read from an existing checkpoint directory.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save parameters as `<prefix>-<step>` and point the index at it.
    pub fn save_model<B: Backend>(
        &self,
        model:  &ResNet<B>,
        prefix: &str,
        step:   u64,
    ) -> Result<PathBuf> {
        let name = format!("{prefix}-{step}");
        let path = self.dir.join(&name);

        let bytes = Recorder::<B>::record(&ParamRecorder::default(), model.clone().into_record(), ())
            .map_err(|e| anyhow::anyhow!("Failed to serialise checkpoint '{}': {:?}", name, e))?;
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let index = CheckpointIndex {
            latest:      name,
            global_step: step,
            saved_at:    Local::now().to_rfc3339(),
        };
        self.write_json(INDEX_FILE, &index)?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    /// Load the latest checkpoint into `model`; returns it with the saved global step.
    pub fn load_model<B: Backend>(
        &self,
        model:  ResNet<B>,
        device: &B::Device,
    ) -> Result<(ResNet<B>, u64)> {
        let index = self.latest()?;
        let path  = self.dir.join(&index.latest);

        tracing::info!("Loading checkpoint '{}' (step {})", path.display(), index.global_step);

        let bytes = fs::read(&path)
            .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;
        let record = Recorder::<B>::load(&ParamRecorder::default(), bytes, device)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load checkpoint '{}', does the network depth match? {:?}",
                path.display(), e
            ))?;

        Ok((model.load_record(record), index.global_step))
    }

    /// Read checkpoint.json
    pub fn latest(&self) -> Result<CheckpointIndex> {
        self.read_json(INDEX_FILE).with_context(|| {
            format!("No checkpoint index in '{}'. Has a run saved here?", self.dir.display())
        })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_classes(&self, classes: &ClassIndex) -> Result<()> {
        self.write_json(CLASSES_FILE, classes)
    }

    pub fn load_classes(&self) -> Result<ClassIndex> {
        self.read_json(CLASSES_FILE)
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hyperparams::ResnetDepth;
    use crate::ml::model::ResNetConfig;
    use burn::backend::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray;

    #[test]
    fn test_save_then_restore_parameters_and_step() {
        let dir    = TempDir::new().unwrap();
        let device = Default::default();
        let ckpt   = CheckpointManager::create(dir.path()).unwrap();

        let saved: ResNet<TestBackend> = ResNetConfig::new(ResnetDepth::D18, 3).init(&device);
        let path = ckpt.save_model(&saved, "resnet18_sgd_x.ckpt", 42).unwrap();
        assert_eq!(path.file_name().unwrap(), "resnet18_sgd_x.ckpt-42");
        assert_eq!(ckpt.latest().unwrap().global_step, 42);

        let fresh: ResNet<TestBackend> = ResNetConfig::new(ResnetDepth::D18, 3).init(&device);
        let (restored, step) = CheckpointManager::open(dir.path()).load_model(fresh, &device).unwrap();
        assert_eq!(step, 42);

        let a: Vec<f32> = saved.fc.weight.val().into_data().to_vec().unwrap();
        let b: Vec<f32> = restored.fc.weight.val().into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_index_tracks_latest_save() {
        let dir    = TempDir::new().unwrap();
        let device = Default::default();
        let ckpt   = CheckpointManager::create(dir.path()).unwrap();
        let model: ResNet<TestBackend> = ResNetConfig::new(ResnetDepth::D18, 2).init(&device);

        ckpt.save_model(&model, "run.ckpt", 10).unwrap();
        ckpt.save_model(&model, "run.ckpt", 20).unwrap();
        let index = ckpt.latest().unwrap();
        assert_eq!(index.latest, "run.ckpt-20");
        assert!(dir.path().join("run.ckpt-10").exists());
    }

    #[test]
    fn test_missing_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(CheckpointManager::open(dir.path()).latest().is_err());
    }

    #[test]
    fn test_classes_round_trip() {
        let dir     = TempDir::new().unwrap();
        let ckpt    = CheckpointManager::create(dir.path().join("nested")).unwrap();
        let classes = ClassIndex::new(vec!["cat".into(), "dog".into()]);
        ckpt.save_classes(&classes).unwrap();
        assert_eq!(ckpt.load_classes().unwrap(), classes);
    }
}
