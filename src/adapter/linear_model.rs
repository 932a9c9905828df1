//! 色統計量に対する線形分類器。学習済みモデルの最小構成。
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::classification::ClassIndex;
use crate::error::CapabilityError;
use crate::port::{InputShape, ModelInput, TrainedModel};

/// チャネルごとの平均と標準偏差。
pub const FEATURE_DIM: usize = 6;

#[derive(Debug, Deserialize)]
struct ModelWeights {
    #[serde(default)]
    input_size: Option<[u32; 2]>,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl ModelWeights {
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.weights.is_empty(), "weight matrix has no classes");
        anyhow::ensure!(
            self.bias.len() == self.weights.len(),
            "bias length mismatch: expected {}, got {}",
            self.weights.len(),
            self.bias.len()
        );
        for row in &self.weights {
            anyhow::ensure!(row.len() == FEATURE_DIM, "weight row length mismatch");
        }
        anyhow::ensure!(
            self.weights.iter().flatten().chain(&self.bias).all(|v| v.is_finite()),
            "weights contain non-finite values"
        );
        if let Some([width, height]) = self.input_size {
            anyhow::ensure!(width > 0 && height > 0, "input_size must be positive");
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct LinearImageModel {
    input_shape: InputShape,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl LinearImageModel {
    /// # Errors
    /// ファイルの読み込み、パース、検証のいずれかに失敗した場合はエラーを返す。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read model weights from {path:?}"))?;
        Self::from_json(&raw)
    }

    /// # Errors
    /// JSON が不正、または行列の形が合わない場合はエラーを返す。
    pub fn from_json(raw: &str) -> Result<Self> {
        let weights: ModelWeights =
            serde_json::from_str(raw).context("failed to parse model weights json")?;
        weights.validate()?;

        let input_shape = weights
            .input_size
            .map_or_else(InputShape::default, |[width, height]| InputShape { width, height });

        Ok(Self {
            input_shape,
            weights: weights.weights,
            bias: weights.bias,
        })
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.weights.len()
    }
}

impl TrainedModel for LinearImageModel {
    fn input_shape(&self) -> InputShape {
        self.input_shape
    }

    fn predict(&self, input: &ModelInput) -> Result<Vec<f32>, CapabilityError> {
        let features = channel_statistics(&input.tensor)?;

        let logits = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| {
                row.iter()
                    .zip(&features)
                    .fold(*bias, |acc, (weight, feature)| acc + weight * feature)
            })
            .collect::<Vec<_>>();

        Ok(softmax(&logits))
    }
}

/// HWC テンソルから `[mean_r, mean_g, mean_b, std_r, std_g, std_b]` を求める。
fn channel_statistics(tensor: &[f32]) -> Result<[f32; FEATURE_DIM], CapabilityError> {
    if tensor.is_empty() || tensor.len() % 3 != 0 {
        return Err(CapabilityError::Input(format!(
            "tensor length {} is not a multiple of 3",
            tensor.len()
        )));
    }

    let pixels = (tensor.len() / 3) as f32;
    let mut sum = [0.0_f32; 3];
    let mut sum_sq = [0.0_f32; 3];
    for pixel in tensor.chunks_exact(3) {
        for (channel, &value) in pixel.iter().enumerate() {
            sum[channel] += value;
            sum_sq[channel] += value * value;
        }
    }

    let mut features = [0.0_f32; FEATURE_DIM];
    for channel in 0..3 {
        let mean = sum[channel] / pixels;
        let variance = (sum_sq[channel] / pixels - mean * mean).max(0.0);
        features[channel] = mean;
        features[channel + 3] = variance.sqrt();
    }
    Ok(features)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = logits.iter().map(|v| (v - max).exp()).collect::<Vec<_>>();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// Keras の `class_indices.json` 形式を読み込む。
///
/// # Errors
/// ファイルの読み込み、パース、添字の検証に失敗した場合はエラーを返す。
pub fn load_class_indices<P: AsRef<Path>>(path: P) -> Result<ClassIndex> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read class indices from {path:?}"))?;
    let indices: HashMap<String, usize> =
        serde_json::from_str(&raw).context("failed to parse class indices json")?;
    ClassIndex::from_indices(&indices).with_context(|| format!("invalid class indices in {path:?}"))
}
