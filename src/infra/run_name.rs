// ============================================================
// Layer 6 — Run Naming
// ============================================================
// Every artifact of a run shares one stem built from the
// network depth, the optimizer and the start time:
//
//   resnet18_sgd_20261019-142501.ckpt-<step>    checkpoints
//   resnet18_sgd_20261019-142501.log            plaintext log
//   resnet18_sgd_20261019-142501.summary.csv    per-step summary

use chrono::Local;

use crate::domain::hyperparams::{OptimizerKind, ResnetDepth};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunName {
    stem: String,
}

impl RunName {
    pub fn new(depth: ResnetDepth, optimizer: OptimizerKind, timestamp: &str) -> Self {
        Self { stem: format!("resnet{}_{}_{}", depth.layers(), optimizer, timestamp) }
    }

    /// Name stamped with the current local time
    pub fn now(depth: ResnetDepth, optimizer: OptimizerKind) -> Self {
        Self::new(depth, optimizer, &Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn checkpoint_prefix(&self) -> String {
        format!("{}.ckpt", self.stem)
    }

    pub fn log_filename(&self) -> String {
        format!("{}.log", self.stem)
    }

    pub fn summary_filename(&self) -> String {
        format!("{}.summary.csv", self.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let name = RunName::new(ResnetDepth::D50, OptimizerKind::Adam, "20260101-000000");
        assert_eq!(name.checkpoint_prefix(), "resnet50_adam_20260101-000000.ckpt");
        assert_eq!(name.log_filename(), "resnet50_adam_20260101-000000.log");
        assert_eq!(name.summary_filename(), "resnet50_adam_20260101-000000.summary.csv");
    }

    #[test]
    fn test_now_uses_timestamp_format() {
        let name = RunName::now(ResnetDepth::D18, OptimizerKind::Sgd);
        let ts   = name.stem().trim_start_matches("resnet18_sgd_");
        assert_eq!(ts.len(), "20260101-000000".len());
        assert!(chrono::NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_ok());
    }
}
