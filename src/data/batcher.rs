// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N ImageItems into
//
//   images  : [N, 3, H, W]        float, CHW pixels
//   one_hot : [N, num_classes]    float, 1.0 at the label
//   targets : [N]                 int, the label itself
//
// The loss is computed against one_hot; accuracy compares the
// arg-max of the logits with targets.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::ImageItem;
use crate::data::preprocessor::CHANNELS;

#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    pub images:  Tensor<B, 4>,
    pub one_hot: Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device:      B::Device,
    image_size:  usize,
    num_classes: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, image_size: usize, num_classes: usize) -> Self {
        Self { device, image_size, num_classes }
    }
}

/// Flat row-major one-hot matrix for `labels`
pub fn one_hot_rows(labels: &[usize], num_classes: usize) -> Vec<f32> {
    let mut rows = vec![0.0f32; labels.len() * num_classes];
    for (row, &label) in labels.iter().enumerate() {
        if label < num_classes {
            rows[row * num_classes + label] = 1.0;
        }
    }
    rows
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let labels: Vec<usize> = items.iter().map(|item| item.label).collect();

        let pixels: Vec<f32> = items
            .into_iter()
            .flat_map(|item| item.pixels)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, self.image_size, self.image_size]),
            &self.device,
        );

        let one_hot = Tensor::<B, 2>::from_data(
            TensorData::new(one_hot_rows(&labels, self.num_classes), [batch_size, self.num_classes]),
            &self.device,
        );

        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels.iter().map(|&l| l as i64).collect::<Vec<_>>(), [batch_size]),
            &self.device,
        );

        ImageBatch { images, one_hot, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_one_hot_rows() {
        let rows = one_hot_rows(&[2, 0], 3);
        assert_eq!(rows, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = ImageBatcher::<NdArray>::new(device, 2, 4);
        let items   = vec![
            ImageItem { pixels: vec![0.5; 12], label: 3 },
            ImageItem { pixels: vec![0.25; 12], label: 1 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        assert_eq!(batch.one_hot.dims(), [2, 4]);
        assert_eq!(batch.len(), 2);

        let one_hot: Vec<f32> = batch.one_hot.into_data().to_vec().unwrap();
        assert_eq!(one_hot, vec![0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![3, 1]);
    }
}
