// ============================================================
// Layer 5 — Residual Network (He et al., 2015)
// ============================================================
// input [N, 3, H, W]
//   → 7x7/2 conv (64) → batch norm → ReLU → 3x3/2 max-pool
//   → stage 1 ( 64 ch, stride 1)
//   → stage 2 (128 ch, stride 2)
//   → stage 3 (256 ch, stride 2)
//   → stage 4 (512 ch, stride 2)
//   → global average pool → linear → logits [N, num_classes]
//
// Depth 18 / 34 stack basic blocks (two 3x3 convs); depth
// 50 / 101 / 152 stack bottleneck blocks (1x1 → 3x3 → 1x1,
// output width ×4). Whenever a block changes stride or width
// its shortcut is a 1x1 conv + batch norm projection.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::{
        activation::{log_softmax, softmax},
        ElementConversion,
    },
};

use crate::data::batcher::ImageBatch;
use crate::domain::hyperparams::{BlockKind, ResnetDepth};

const STEM_WIDTH: usize = 64;

#[derive(Config, Debug)]
pub struct ResNetConfig {
    pub depth:       ResnetDepth,
    pub num_classes: usize,
    #[config(default = "3")]
    pub in_channels: usize,
}

impl ResNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet<B> {
        let kind      = self.depth.block_kind();
        let expansion = expansion(kind);

        let stem     = ConvBn::new(self.in_channels, STEM_WIDTH, 7, 2, 3, device);
        let max_pool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let mut blocks   = Vec::new();
        let mut in_width = STEM_WIDTH;
        for (stage, &count) in self.depth.stage_blocks().iter().enumerate() {
            let width = STEM_WIDTH << stage;
            for i in 0..count {
                let stride = if stage > 0 && i == 0 { 2 } else { 1 };
                blocks.push(ResidualBlock::new(kind, in_width, width, stride, device));
                in_width = width * expansion;
            }
        }

        ResNet {
            stem,
            max_pool,
            blocks,
            avg_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc:       LinearConfig::new(in_width, self.num_classes).init(device),
            relu:     Relu::new(),
        }
    }
}

fn expansion(kind: BlockKind) -> usize {
    match kind {
        BlockKind::Basic      => 1,
        BlockKind::Bottleneck => 4,
    }
}

// ─── ConvBn ───────────────────────────────────────────────────────────────────
/// Bias-free convolution followed by batch norm.
#[derive(Module, Debug)]
pub struct ConvBn<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn:   BatchNorm<B, 2>,
}

impl<B: Backend> ConvBn<B> {
    pub fn new(
        in_channels:  usize,
        out_channels: usize,
        kernel:       usize,
        stride:       usize,
        padding:      usize,
        device:       &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_bias(false)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        Self { conv, bn }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bn.forward(self.conv.forward(x))
    }
}

// ─── ResidualBlock ────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    /// Two convs for a basic block, three for a bottleneck
    pub convs:    Vec<ConvBn<B>>,
    pub shortcut: Option<ConvBn<B>>,
    pub relu:     Relu,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn new(
        kind:     BlockKind,
        in_width: usize,
        width:    usize,
        stride:   usize,
        device:   &B::Device,
    ) -> Self {
        let out_width = width * expansion(kind);
        let convs = match kind {
            BlockKind::Basic => vec![
                ConvBn::new(in_width, width, 3, stride, 1, device),
                ConvBn::new(width, width, 3, 1, 1, device),
            ],
            BlockKind::Bottleneck => vec![
                ConvBn::new(in_width, width, 1, 1, 0, device),
                ConvBn::new(width, width, 3, stride, 1, device),
                ConvBn::new(width, out_width, 1, 1, 0, device),
            ],
        };
        let shortcut = (stride != 1 || in_width != out_width)
            .then(|| ConvBn::new(in_width, out_width, 1, stride, 0, device));

        Self { convs, shortcut, relu: Relu::new() }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.shortcut {
            Some(projection) => projection.forward(x.clone()),
            None => x.clone(),
        };

        let last    = self.convs.len() - 1;
        let mut out = x;
        for (i, conv) in self.convs.iter().enumerate() {
            out = conv.forward(out);
            if i < last {
                out = self.relu.forward(out);
            }
        }
        self.relu.forward(out + identity)
    }
}

// ─── ResNet ───────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    pub stem:     ConvBn<B>,
    pub max_pool: MaxPool2d,
    pub blocks:   Vec<ResidualBlock<B>>,
    pub avg_pool: AdaptiveAvgPool2d,
    pub fc:       Linear<B>,
    pub relu:     Relu,
}

/// Loss and accuracy bookkeeping for one batch.
pub struct StepOutput<B: Backend> {
    pub loss:       Tensor<B, 1>,
    pub correct:    usize,
    pub batch_size: usize,
}

impl<B: Backend> ResNet<B> {
    /// images [N, C, H, W] → logits [N, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.stem.forward(images));
        let mut x = self.max_pool.forward(x);
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = self.avg_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        self.fc.forward(x.reshape([batch_size, channels]))
    }

    /// Softmax class probabilities
    pub fn probabilities(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }

    /// Forward pass plus loss against the one-hot labels and the
    /// number of arg-max predictions matching the targets.
    pub fn forward_step(&self, batch: ImageBatch<B>) -> StepOutput<B> {
        let batch_size = batch.len();
        let logits     = self.forward(batch.images);
        let correct    = correct_count(logits.clone(), batch.targets);
        let loss       = softmax_cross_entropy(logits, batch.one_hot);
        StepOutput { loss, correct, batch_size }
    }
}

/// Mean over the batch of −Σ one_hot · log_softmax(logits)
pub fn softmax_cross_entropy<B: Backend>(logits: Tensor<B, 2>, one_hot: Tensor<B, 2>) -> Tensor<B, 1> {
    (one_hot * log_softmax(logits, 1)).sum_dim(1).neg().mean()
}

/// How many rows of `logits` have their arg-max at the target class
pub fn correct_count<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted.equal(targets).int().sum().into_scalar().elem::<i64>();
    correct.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    #[test]
    fn test_resnet18_logit_shape() {
        let device = Default::default();
        let model: ResNet<TestBackend> = ResNetConfig::new(ResnetDepth::D18, 5).init(&device);
        assert_eq!(model.blocks.len(), 8);

        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        assert_eq!(model.forward(images).dims(), [2, 5]);
    }

    #[test]
    fn test_resnet50_uses_bottlenecks() {
        let device = Default::default();
        let model: ResNet<TestBackend> = ResNetConfig::new(ResnetDepth::D50, 3).init(&device);
        assert_eq!(model.blocks.len(), 16);
        assert_eq!(model.blocks[0].convs.len(), 3);
        // first bottleneck widens 64 → 256, so it needs a projection
        assert!(model.blocks[0].shortcut.is_some());
        assert!(model.blocks[1].shortcut.is_none());

        let images = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let probs: Vec<f32> = model.probabilities(images).into_data().to_vec().unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cross_entropy_of_uniform_logits() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let one_hot = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 0., 0., 0., 0., 0., 1., 0.], [2, 4]),
            &device,
        );
        let loss: f32 = softmax_cross_entropy(logits, one_hot).into_scalar().elem();
        assert!((loss - 4.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_correct_count() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.1f32, 0.9, 0.8, 0.2, 0.3, 0.7], [3, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 1, 1], [3]),
            &device,
        );
        assert_eq!(correct_count(logits, targets), 2);
    }
}
