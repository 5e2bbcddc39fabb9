// ============================================================
// Layer 3 — Hyperparameter Selectors
// ============================================================
// The closed sets of choices a run is configured with. Each
// selector parses from the string a user types on the command
// line (or stores in train_config.json) and rejects anything
// outside its set with a ConfigError.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ─── ResnetDepth ──────────────────────────────────────────────────────────────
/// Number of weighted layers in the residual network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum ResnetDepth {
    D18,
    D34,
    D50,
    D101,
    D152,
}

/// Residual block flavour used by a depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Two 3x3 convolutions, expansion 1
    Basic,
    /// 1x1 → 3x3 → 1x1 convolutions, expansion 4
    Bottleneck,
}

impl ResnetDepth {
    pub const ALL: [ResnetDepth; 5] = [Self::D18, Self::D34, Self::D50, Self::D101, Self::D152];

    pub fn layers(self) -> usize {
        match self {
            Self::D18  => 18,
            Self::D34  => 34,
            Self::D50  => 50,
            Self::D101 => 101,
            Self::D152 => 152,
        }
    }

    /// Blocks per stage for the four stages
    pub fn stage_blocks(self) -> [usize; 4] {
        match self {
            Self::D18  => [2, 2, 2, 2],
            Self::D34  => [3, 4, 6, 3],
            Self::D50  => [3, 4, 6, 3],
            Self::D101 => [3, 4, 23, 3],
            Self::D152 => [3, 8, 36, 3],
        }
    }

    pub fn block_kind(self) -> BlockKind {
        match self {
            Self::D18 | Self::D34 => BlockKind::Basic,
            _ => BlockKind::Bottleneck,
        }
    }
}

impl TryFrom<usize> for ResnetDepth {
    type Error = ConfigError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.layers() == value)
            .ok_or_else(|| ConfigError::InvalidDepth(value.to_string()))
    }
}

impl From<ResnetDepth> for usize {
    fn from(depth: ResnetDepth) -> Self {
        depth.layers()
    }
}

impl FromStr for ResnetDepth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidDepth(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for ResnetDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layers())
    }
}

// ─── OptimizerKind ────────────────────────────────────────────────────────────
/// Which update rule drives the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Momentum,
    Adam,
}

impl OptimizerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sgd      => "sgd",
            Self::Momentum => "momentum",
            Self::Adam     => "adam",
        }
    }
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // "agd" is a long-standing typo of "sgd" in older run scripts
            "sgd" | "agd" => Ok(Self::Sgd),
            "momentum"    => Ok(Self::Momentum),
            "adam"        => Ok(Self::Adam),
            _ => Err(ConfigError::InvalidOptimizer(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── RunMode ──────────────────────────────────────────────────────────────────
/// Start from fresh parameters or continue from a saved checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Restart,
    Restore,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(Self::Restart),
            "restore" => Ok(Self::Restore),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restart => f.write_str("restart"),
            Self::Restore => f.write_str("restore"),
        }
    }
}

// ─── ComputeBackend ───────────────────────────────────────────────────────────
/// Tensor backend the run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeBackend {
    #[default]
    Wgpu,
    NdArray,
}

impl FromStr for ComputeBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wgpu" | "gpu"           => Ok(Self::Wgpu),
            "ndarray" | "cpu"        => Ok(Self::NdArray),
            _ => Err(ConfigError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for ComputeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wgpu    => f.write_str("wgpu"),
            Self::NdArray => f.write_str("ndarray"),
        }
    }
}
