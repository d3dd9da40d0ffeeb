//! PDF→image job: rasterise every page of one document via the engine.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and no async interface.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads never stall during CPU-heavy rendering.
//!
//! ## Sizing
//!
//! Raster size is the page's intrinsic size times `dpi / 72`, truncated to
//! whole pixels. A page whose raster would exceed
//! [`PdfToImageConfig::max_raster_pixels`] fails with a resource error rather
//! than being silently downscaled.

use crate::config::{PageGeometry, PdfToImageConfig, BASE_DPI};
use crate::engine::PdfEngine;
use crate::error::ConvertError;
use crate::job::JobController;
use crate::output::Artifact;
use crate::pipeline::encode::encode_raster;
use std::sync::Arc;
use tracing::{debug, info};

/// Rasterise every page of `pdf`, in page order.
///
/// # Returns
/// One [`Artifact`] per page, named `page_<n>.<ext>`.
pub async fn rasterise_pdf(
    engine: Arc<dyn PdfEngine>,
    pdf: Arc<[u8]>,
    config: PdfToImageConfig,
    job: Arc<JobController>,
) -> Result<Vec<Artifact>, ConvertError> {
    tokio::task::spawn_blocking(move || rasterise_pdf_blocking(engine.as_ref(), &pdf, &config, &job))
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of [`rasterise_pdf`].
pub fn rasterise_pdf_blocking(
    engine: &dyn PdfEngine,
    pdf: &[u8],
    config: &PdfToImageConfig,
    job: &JobController,
) -> Result<Vec<Artifact>, ConvertError> {
    config.validate()?;
    check_magic(pdf)?;

    let mut artifacts = Vec::new();

    engine.open(pdf, &mut |pages| {
        let total = pages.page_count();
        if total == 0 {
            return Err(ConvertError::Decode {
                index: 0,
                detail: "document has no pages".into(),
            });
        }
        job.start(total);
        info!("Rasterising {} pages at {} DPI as {}", total, config.dpi, config.format);

        for index in 0..total {
            let page_num = index + 1;
            let size = pages.page_size(index)?;
            let (width, height) = raster_dimensions(size, config.dpi);

            let pixels = width as u64 * height as u64;
            if pixels > config.max_raster_pixels {
                return Err(ConvertError::Resource {
                    detail: format!(
                        "page {page_num} needs {width}x{height} px, limit is {} px",
                        config.max_raster_pixels
                    ),
                });
            }

            let image = pages.render_page(index, width, height)?;
            debug!("Rendered page {} → {}x{} px", page_num, image.width(), image.height());

            let data = encode_raster(&image, config.format, config.quality).map_err(|e| {
                ConvertError::Render {
                    page: page_num,
                    detail: format!("Image encoding failed: {}", e),
                }
            })?;
            artifacts.push(Artifact::page(page_num, config.format, data));

            job.item_done(page_num);
        }
        Ok(())
    })?;

    Ok(artifacts)
}

/// Pixel size of a page rendered at `dpi`.
///
/// Computed in `f64` from the integer DPI so whole-pixel results such as
/// 792 pt at 150 DPI land on 1650, not 1649.
pub fn raster_dimensions(size: PageGeometry, dpi: u32) -> (u32, u32) {
    let px = |pt: f32| (pt as f64 * dpi as f64 / BASE_DPI as f64).floor().max(1.0) as u32;
    (px(size.width_pt), px(size.height_pt))
}

fn check_magic(pdf: &[u8]) -> Result<(), ConvertError> {
    if pdf.starts_with(b"%PDF") {
        return Ok(());
    }
    Err(ConvertError::NotAPdf {
        magic: pdf.iter().take(4).copied().collect(),
    })
}
