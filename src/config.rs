//! Configuration records for both conversion directions.
//!
//! Each job takes one immutable config record, built via its builder or
//! taken from `Default`. The enums serialise to the lowercase names used by
//! front ends (`"a4"`, `"landscape"`, `"webp"`, …) so a config can be
//! round-tripped through JSON unchanged.
//!
//! # Example
//! ```rust
//! use imgpdf::{ImageToPdfConfig, Orientation, PageSize};
//!
//! let config = ImageToPdfConfig::builder()
//!     .page_size(PageSize::Letter)
//!     .orientation(Orientation::Landscape)
//!     .quality(0.9)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.geometry().width_pt, 792.0);
//! ```

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// PDF reference resolution: one PDF point per pixel at 72 DPI.
pub const BASE_DPI: u32 = 72;

/// Upper bound accepted for [`PdfToImageConfig::dpi`].
pub const MAX_DPI: u32 = 1200;

// ── Image → PDF ──────────────────────────────────────────────────────────

/// Configuration for composing images into one PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageToPdfConfig {
    /// Paper size used for every page. Default: A4.
    pub page_size: PageSize,

    /// Orientation used for every page. Default: portrait.
    pub orientation: Orientation,

    /// JPEG quality fraction for embedded images, in `[0, 1]`. Default: 0.8.
    ///
    /// Every image is re-encoded as JPEG before embedding, so this trades
    /// output size against fidelity uniformly across the document.
    pub quality: f32,
}

impl Default for ImageToPdfConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            quality: 0.8,
        }
    }
}

impl ImageToPdfConfig {
    /// Create a new builder for `ImageToPdfConfig`.
    pub fn builder() -> ImageToPdfConfigBuilder {
        ImageToPdfConfigBuilder {
            config: Self::default(),
        }
    }

    /// The single page geometry shared by every page of the document.
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_size, self.orientation)
    }

    /// Check the invariants a builder enforces; used on deserialised configs.
    pub fn validate(&self) -> Result<(), ConvertError> {
        validate_quality(self.quality)
    }
}

/// Builder for [`ImageToPdfConfig`].
#[derive(Debug)]
pub struct ImageToPdfConfigBuilder {
    config: ImageToPdfConfig,
}

impl ImageToPdfConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.config.quality = quality;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ImageToPdfConfig, ConvertError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── PDF → images ─────────────────────────────────────────────────────────

/// Configuration for rasterising each page of a PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfToImageConfig {
    /// Output raster format. Default: PNG.
    pub format: RasterFormat,

    /// Quality fraction in `[0, 1]`; only JPEG uses it. Default: 0.8.
    pub quality: f32,

    /// Rendering resolution. 72 DPI renders one pixel per PDF point. Default: 150.
    pub dpi: u32,

    /// Largest raster (width × height, in pixels) the pipeline will allocate.
    /// Default: 100 000 000.
    ///
    /// A 1200-DPI render of an A0 poster would need well over a gigabyte of
    /// pixels; pages beyond this bound fail with a resource error instead.
    #[serde(default = "default_max_raster_pixels")]
    pub max_raster_pixels: u64,
}

fn default_max_raster_pixels() -> u64 {
    100_000_000
}

impl Default for PdfToImageConfig {
    fn default() -> Self {
        Self {
            format: RasterFormat::Png,
            quality: 0.8,
            dpi: 150,
            max_raster_pixels: default_max_raster_pixels(),
        }
    }
}

impl PdfToImageConfig {
    /// Create a new builder for `PdfToImageConfig`.
    pub fn builder() -> PdfToImageConfigBuilder {
        PdfToImageConfigBuilder {
            config: Self::default(),
        }
    }

    /// Pixels per PDF point.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / BASE_DPI as f32
    }

    /// Check the invariants a builder enforces; used on deserialised configs.
    pub fn validate(&self) -> Result<(), ConvertError> {
        validate_quality(self.quality)?;
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 1–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.max_raster_pixels == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_raster_pixels must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`PdfToImageConfig`].
#[derive(Debug)]
pub struct PdfToImageConfigBuilder {
    config: PdfToImageConfig,
}

impl PdfToImageConfigBuilder {
    pub fn format(mut self, format: RasterFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_raster_pixels(mut self, px: u64) -> Self {
        self.config.max_raster_pixels = px;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfToImageConfig, ConvertError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn validate_quality(quality: f32) -> Result<(), ConvertError> {
    if !quality.is_finite() || !(0.0..=1.0).contains(&quality) {
        return Err(ConvertError::InvalidConfig(format!(
            "Quality must be within 0.0–1.0, got {quality}"
        )));
    }
    Ok(())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Paper size for generated PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
    /// 8.5 × 14 in.
    Legal,
}

impl PageSize {
    /// Portrait `(width, height)` in PDF points.
    pub fn portrait_points(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

/// Page orientation for generated PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Output format for rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Lossless; quality is ignored. (default)
    #[default]
    Png,
    /// Lossy; honours the quality fraction.
    Jpeg,
    /// Lossy; honours the quality fraction.
    Webp,
}

impl RasterFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Webp => "image/webp",
        }
    }

    /// Whether the quality fraction affects the encoded output.
    pub fn is_lossy(self) -> bool {
        matches!(self, RasterFormat::Jpeg | RasterFormat::Webp)
    }
}

macro_rules! lowercase_display {
    ($ty:ty, { $($variant:path => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let s = match self { $($variant => $name),+ };
                f.write_str(s)
            }
        }
    };
}

lowercase_display!(PageSize, {
    PageSize::A4 => "a4",
    PageSize::Letter => "letter",
    PageSize::Legal => "legal",
});

lowercase_display!(Orientation, {
    Orientation::Portrait => "portrait",
    Orientation::Landscape => "landscape",
});

lowercase_display!(RasterFormat, {
    RasterFormat::Png => "png",
    RasterFormat::Jpeg => "jpeg",
    RasterFormat::Webp => "webp",
});

/// Physical page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageGeometry {
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        let (w, h) = size.portrait_points();
        match orientation {
            Orientation::Portrait => Self {
                width_pt: w,
                height_pt: h,
            },
            Orientation::Landscape => Self {
                width_pt: h,
                height_pt: w,
            },
        }
    }
}
