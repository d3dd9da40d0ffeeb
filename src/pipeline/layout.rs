//! Image placement on a page.
//!
//! Images are scaled to the page width first; if that makes them taller
//! than the page, they are scaled to the page height instead. The result is
//! centred on both axes, so an image is never cropped or stretched.

use crate::config::PageGeometry;
use serde::{Deserialize, Serialize};

/// Position and size of an image on a page, in PDF points.
///
/// `(x_pt, y_pt)` is the lower-left corner, PDF's native origin. Because the
/// image is centred, the margins are symmetric and the same values hold for
/// a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x_pt: f32,
    pub y_pt: f32,
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Fit a `width_px × height_px` image inside `page`, preserving aspect ratio.
///
/// Both pixel dimensions must be non-zero; the decoder rejects empty images
/// before they get here.
pub fn fit_centered(width_px: u32, height_px: u32, page: PageGeometry) -> Placement {
    let ratio = width_px as f32 / height_px as f32;

    let mut width = page.width_pt;
    let mut height = width / ratio;
    if height > page.height_pt {
        height = page.height_pt;
        width = height * ratio;
    }

    Placement {
        x_pt: (page.width_pt - width) / 2.0,
        y_pt: (page.height_pt - height) / 2.0,
        width_pt: width,
        height_pt: height,
    }
}
