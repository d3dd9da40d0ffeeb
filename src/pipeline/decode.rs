//! Uploaded image → JPEG ready for embedding.
//!
//! Every image is re-encoded as JPEG at the job's quality, whatever format it
//! arrived in, so one quality setting governs the whole document. Transparent
//! pixels are flattened onto white first; JPEG has no alpha channel and would
//! otherwise show them black.

use crate::error::ConvertError;
use crate::pipeline::encode::quality_percent;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

/// A decoded image, re-encoded as JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Decode input `index` of a job.
pub fn decode_image(index: usize, bytes: &[u8]) -> Result<DynamicImage, ConvertError> {
    let img = image::load_from_memory(bytes).map_err(|e| ConvertError::Decode {
        index,
        detail: e.to_string(),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ConvertError::Decode {
            index,
            detail: "image has no pixels".into(),
        });
    }
    Ok(img)
}

/// Decode input `index` and re-encode it as JPEG at `quality`.
pub fn prepare_for_embedding(
    index: usize,
    bytes: &[u8],
    quality: f32,
) -> Result<EmbeddedImage, ConvertError> {
    let img = decode_image(index, bytes)?;
    let rgb = flatten_onto_white(&img);

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality_percent(quality));
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| ConvertError::Decode {
            index,
            detail: format!("JPEG re-encode failed: {e}"),
        })?;

    debug!(
        "Input {}: {}x{} → {} bytes JPEG",
        index,
        img.width(),
        img.height(),
        jpeg.len()
    );
    Ok(EmbeddedImage {
        jpeg,
        width_px: img.width(),
        height_px: img.height(),
    })
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn png_becomes_jpeg_with_same_dimensions() {
        let embedded = prepare_for_embedding(0, &png(30, 20, Rgba([10, 20, 30, 255])), 0.8).unwrap();
        assert_eq!((embedded.width_px, embedded.height_px), (30, 20));
        assert_eq!(image::guess_format(&embedded.jpeg).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_is_a_decode_error_with_index() {
        let err = prepare_for_embedding(4, b"definitely not an image", 0.8).unwrap_err();
        match err {
            ConvertError::Decode { index, .. } => assert_eq!(index, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transparent_pixels_become_white() {
        let embedded = prepare_for_embedding(0, &png(8, 8, Rgba([0, 0, 0, 0])), 1.0).unwrap();
        let decoded = image::load_from_memory(&embedded.jpeg).unwrap().to_rgb8();
        let Rgb([r, g, b]) = *decoded.get_pixel(4, 4);
        assert!(r > 245 && g > 245 && b > 245, "got {r},{g},{b}");
    }
}
