//! Image→PDF job: one page per image, all pages sharing one geometry.

use crate::config::ImageToPdfConfig;
use crate::engine::PdfEngine;
use crate::error::ConvertError;
use crate::job::JobController;
use crate::pipeline::decode::prepare_for_embedding;
use crate::pipeline::layout::fit_centered;
use crate::registry::FileKind;
use std::sync::Arc;
use tracing::{debug, info};

/// Compose `images` into a single PDF, one page each, in input order.
///
/// Runs the blocking work on `spawn_blocking`. Progress is reported through
/// `job` after every image.
///
/// # Errors
/// * [`ConvertError::NoInput`] — `images` is empty
/// * [`ConvertError::Decode`] — an image could not be decoded; `index` names it
/// * [`ConvertError::Render`] — the engine rejected a page or image
pub async fn compose_pdf(
    engine: Arc<dyn PdfEngine>,
    images: Vec<Arc<[u8]>>,
    config: ImageToPdfConfig,
    job: Arc<JobController>,
) -> Result<Vec<u8>, ConvertError> {
    tokio::task::spawn_blocking(move || compose_pdf_blocking(engine.as_ref(), &images, &config, &job))
        .await
        .map_err(|e| ConvertError::Internal(format!("Compose task panicked: {}", e)))?
}

/// Blocking implementation of [`compose_pdf`].
pub fn compose_pdf_blocking(
    engine: &dyn PdfEngine,
    images: &[Arc<[u8]>],
    config: &ImageToPdfConfig,
    job: &JobController,
) -> Result<Vec<u8>, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NoInput(FileKind::Image));
    }
    config.validate()?;

    let geometry = config.geometry();
    let total = images.len();
    job.start(total);
    info!(
        "Composing {} images onto {} {} pages",
        total, config.page_size, config.orientation
    );

    engine.compose(&mut |doc| {
        for (i, bytes) in images.iter().enumerate() {
            let embedded = prepare_for_embedding(i, bytes, config.quality)?;
            let placement = fit_centered(embedded.width_px, embedded.height_px, geometry);

            doc.add_page(geometry)?;
            doc.place_image(&embedded, placement)?;
            debug!(
                "Page {}: {}x{} px at ({:.1}, {:.1}) size {:.1}x{:.1} pt",
                i + 1,
                embedded.width_px,
                embedded.height_px,
                placement.x_pt,
                placement.y_pt,
                placement.width_pt,
                placement.height_pt
            );

            job.item_done(i + 1);
        }
        Ok(())
    })
}
