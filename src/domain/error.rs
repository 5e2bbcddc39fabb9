// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Typed errors for the two ways a run can be rejected before
// any tensor work happens: a bad configuration, or a dataset
// directory that cannot produce samples. Everything else
// (I/O, decoding, record files) travels as anyhow::Error.

use std::path::PathBuf;

use thiserror::Error;

/// A configuration value that cannot be used for a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid run mode '{0}', please input 'restart' or 'restore'")]
    InvalidMode(String),

    #[error("Invalid optimizer '{0}', please input 'sgd', 'momentum' or 'adam'")]
    InvalidOptimizer(String),

    #[error("Unsupported ResNet depth '{0}', expected one of 18, 34, 50, 101, 152")]
    InvalidDepth(String),

    #[error("Invalid backend '{0}', please input 'wgpu' or 'ndarray'")]
    InvalidBackend(String),

    #[error("{name} must lie in [0, 1), got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },

    #[error("test ratio + validation ratio must be below 1, got {0}")]
    RatiosTooLarge(f64),

    #[error("the momentum optimizer requires a momentum value")]
    MissingMomentum,

    #[error("run mode 'restore' requires a trained model directory")]
    MissingRestoreDir,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// A dataset directory that cannot be split into samples
#[derive(Error, Debug)]
pub enum DataError {
    #[error("data directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("data directory contains no class folders: {0}")]
    NoClasses(PathBuf),

    #[error("data directory contains no images: {0}")]
    NoImages(PathBuf),

    #[error("class folder name is not valid UTF-8: {0}")]
    ClassNameNotUtf8(PathBuf),

    #[error("found {found} classes in the data directory but the network has {expected}")]
    TooManyClasses { found: usize, expected: usize },

    #[error("the {split} split is empty; add images or change the split ratios")]
    EmptySplit { split: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidMode("resume".to_string());
        assert!(err.to_string().contains("'resume'"));

        let err = ConfigError::RatioOutOfRange { name: "test ratio", value: 1.5 };
        assert_eq!(err.to_string(), "test ratio must lie in [0, 1), got 1.5");
    }

    #[test]
    fn test_data_error_display() {
        let err = DataError::NoImages(PathBuf::from("/data/empty"));
        assert!(err.to_string().contains("/data/empty"));

        let err = DataError::EmptySplit { split: "test" };
        assert!(err.to_string().starts_with("the test split is empty"));
    }
}
