//! 分類コアが利用する外部分類器のインターフェース。
//!
//! 実体はプロセス起動時に境界側で構築され、以後は読み取り専用で共有される。
//! どちらも同期呼び出しで、タイムアウトは境界側が課す。
use image::RgbImage;

use crate::error::CapabilityError;

/// モデルが期待する入力解像度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub width: u32,
    pub height: u32,
}

impl Default for InputShape {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
        }
    }
}

/// 画素値のスケーリング方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelScale {
    /// `[0, 1]`
    Unit,
    /// `[-1, 1]`
    Symmetric,
}

/// リサイズ・正規化済みのモデル入力。
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub shape: InputShape,
    /// リサイズ後の RGB 画像。
    pub rgb: RgbImage,
    /// HWC 順の正規化済みテンソル（長さは width * height * 3）。
    pub tensor: Vec<f32>,
}

/// 汎用画像認識のラベルとスコア。
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub score: f64,
}

/// 廃棄物カテゴリで学習済みのモデル。
pub trait TrainedModel: Send + Sync {
    fn input_shape(&self) -> InputShape {
        InputShape::default()
    }

    /// クラス数と同じ長さの確率ベクトルを返す。
    fn predict(&self, input: &ModelInput) -> Result<Vec<f32>, CapabilityError>;
}

/// 汎用の物体認識モデル。スコア降順のラベル列を返す。
pub trait GenericVision: Send + Sync {
    fn input_shape(&self) -> InputShape {
        InputShape::default()
    }

    fn predict(&self, input: &ModelInput) -> Result<Vec<Detection>, CapabilityError>;

    /// ログとヘルスチェック用の名前。
    fn name(&self) -> &str;
}
