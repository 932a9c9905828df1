use image::{DynamicImage, imageops::FilterType};

use crate::error::{CapabilityError, ClassifyError};
use crate::port::{InputShape, ModelInput, PixelScale};

/// 段の振り分け前にデコード済みの画像。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    byte_len: usize,
}

impl DecodedImage {
    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// 元のバイト列の長さ。ランダム段の添字に使う。
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// # Errors
/// 空、または画像として解釈できないバイト列は [`ClassifyError::Processing`]。
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, ClassifyError> {
    if bytes.is_empty() {
        return Err(ClassifyError::Processing("image payload is empty".into()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|error| ClassifyError::Processing(format!("cannot decode image: {error}")))?;
    Ok(DecodedImage {
        image,
        byte_len: bytes.len(),
    })
}

/// RGB 化、リサイズ、スケーリングを行う。
///
/// # Errors
/// 入力解像度が 0 の場合は [`CapabilityError::Input`]。
pub fn prepare(
    decoded: &DecodedImage,
    shape: InputShape,
    scale: PixelScale,
) -> Result<ModelInput, CapabilityError> {
    if shape.width == 0 || shape.height == 0 {
        return Err(CapabilityError::Input(format!(
            "input shape {}x{} is empty",
            shape.width, shape.height
        )));
    }

    let rgb = decoded
        .image
        .resize_exact(shape.width, shape.height, FilterType::Triangle)
        .to_rgb8();

    let tensor = rgb
        .as_raw()
        .iter()
        .map(|&value| {
            let unit = f32::from(value) / 255.0;
            match scale {
                PixelScale::Unit => unit,
                PixelScale::Symmetric => unit * 2.0 - 1.0,
            }
        })
        .collect();

    Ok(ModelInput { shape, rgb, tensor })
}
