//! Raster encoding: `DynamicImage` → PNG / JPEG / WEBP bytes.
//!
//! PNG is written losslessly and ignores the quality fraction. JPEG and WEBP
//! map the fraction onto their encoders' 1–100 scale and drop alpha.
//!
//! `image` only writes lossless WEBP, so WEBP goes through libwebp via the
//! `webp` crate.

use crate::config::RasterFormat;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Map a `[0, 1]` quality fraction to the lossy encoders' `1..=100` scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode a rendered page in `format`.
pub fn encode_raster(
    img: &DynamicImage,
    format: RasterFormat,
    quality: f32,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        RasterFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
        RasterFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality_percent(quality));
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        RasterFormat::Webp => {
            let rgb = img.to_rgb8();
            let encoded = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                .encode(quality_percent(quality) as f32);
            buf.extend_from_slice(&encoded);
        }
    }

    debug!("Encoded {}x{} → {} bytes {}", img.width(), img.height(), buf.len(), format);
    Ok(buf)
}
