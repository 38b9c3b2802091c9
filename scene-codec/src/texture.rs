//! Texture payloads with a separate alpha image
//!
//! Neither payload format stores alpha reliably at low quality, so every
//! texture is written as two opaque images:
//! - color: the RGB channels, at `color_quality`
//! - alpha: an image whose R, G and B all equal the source alpha, at `alpha_quality`
//!
//! Decoding sniffs the payload format from its bytes, so files written with
//! JPEG and PNG payloads read the same way.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use scene_common::{CodecError, FormatError};
use serde::{Deserialize, Serialize};

/// Default JPEG quality of the color payload
pub const DEFAULT_COLOR_QUALITY: u8 = 60;

/// Default JPEG quality of the alpha payload
pub const DEFAULT_ALPHA_QUALITY: u8 = 95;

/// Compression used for texture payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Lossy, quality-controlled
    #[default]
    Jpeg,
    /// Lossless, quality settings are ignored
    Png,
}

/// Settings for [`split_alpha`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAlphaOptions {
    pub format: PayloadFormat,
    pub color_quality: u8,
    pub alpha_quality: u8,
}

impl Default for SplitAlphaOptions {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Jpeg,
            color_quality: DEFAULT_COLOR_QUALITY,
            alpha_quality: DEFAULT_ALPHA_QUALITY,
        }
    }
}

impl SplitAlphaOptions {
    /// Lossless payloads, for archival and exact round trips
    pub fn lossless() -> Self {
        Self {
            format: PayloadFormat::Png,
            ..Self::default()
        }
    }
}

/// Compressed color and alpha payloads of one texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAlphaPayload {
    pub color: Vec<u8>,
    pub alpha: Vec<u8>,
}

/// Compress `image` into a color payload and an alpha payload
pub fn split_alpha(
    image: &RgbaImage,
    options: &SplitAlphaOptions,
) -> Result<SplitAlphaPayload, CodecError> {
    let color = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Rgb([r, g, b])
    });
    let alpha = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let a = image.get_pixel(x, y).0[3];
        Rgb([a, a, a])
    });

    Ok(SplitAlphaPayload {
        color: compress(&color, options.format, options.color_quality)?,
        alpha: compress(&alpha, options.format, options.alpha_quality)?,
    })
}

/// Compress only the color channels (alpha is dropped)
pub fn compress_opaque(
    image: &RgbaImage,
    options: &SplitAlphaOptions,
) -> Result<Vec<u8>, CodecError> {
    let color = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    compress(&color, options.format, options.color_quality)
}

fn compress(image: &RgbImage, format: PayloadFormat, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    match format {
        PayloadFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            encoder.encode_image(image)?;
        }
        PayloadFormat::Png => {
            image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        }
    }
    Ok(bytes)
}

fn decompress(bytes: &[u8]) -> Result<RgbImage, FormatError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|e| FormatError::InvalidImage(e.to_string()))
}

/// Rebuild an RGBA image: RGB from `color`, A from the red channel of `alpha`
pub fn join_alpha(color: &[u8], alpha: &[u8]) -> Result<RgbaImage, FormatError> {
    let color = decompress(color)?;
    let alpha = decompress(alpha)?;

    if color.dimensions() != alpha.dimensions() {
        return Err(FormatError::AlphaMismatch {
            color_width: color.width(),
            color_height: color.height(),
            alpha_width: alpha.width(),
            alpha_height: alpha.height(),
        });
    }

    Ok(RgbaImage::from_fn(color.width(), color.height(), |x, y| {
        let [r, g, b] = color.get_pixel(x, y).0;
        let a = alpha.get_pixel(x, y).0[0];
        image::Rgba([r, g, b, a])
    }))
}

/// Decode a color payload that has no alpha companion (alpha = 255)
pub fn decode_opaque(color: &[u8]) -> Result<RgbaImage, FormatError> {
    let color = decompress(color)?;
    Ok(DynamicImage::ImageRgb8(color).to_rgba8())
}
