//! Conversion entry points.
//!
//! [`Converter`] ties the pipelines to a [`FileRegistry`]: it claims the
//! registry's progress slot, moves the job's entries through
//! `processing → completed | error`, and attaches the produced
//! [`Artifact`]s or the failure message to each entry.
//!
//! [`Converter::convert_images`] and [`Converter::convert_pdf`] skip the
//! registry and work on raw blobs, for callers that track files themselves.
//!
//! ## Failure policy
//!
//! A job is fail-fast. When it aborts, every entry that took part is marked
//! `error`: the entry that caused the failure carries the cause, the others
//! carry [`ItemError::Aborted`] naming it. When the cause cannot be pinned to
//! one entry (engine missing, internal error), every entry carries it.

use crate::config::{ImageToPdfConfig, PdfToImageConfig};
use crate::engine::{PdfEngine, PdfiumEngine};
use crate::error::{ConvertError, ItemError};
use crate::job::JobController;
use crate::output::Artifact;
use crate::pipeline::{compose, raster};
use crate::progress::ProgressCallback;
use crate::registry::{FileId, FileKind, FileRegistry, FileStatus};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs conversion jobs against a PDF engine.
#[derive(Clone)]
pub struct Converter {
    engine: Arc<dyn PdfEngine>,
    callback: Option<ProgressCallback>,
}

/// An entry taking part in a job, snapshotted before the job starts.
struct JobEntry {
    id: FileId,
    name: String,
    data: Arc<[u8]>,
}

impl Converter {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            engine,
            callback: None,
        }
    }

    /// A converter backed by pdfium, bound via [`PdfiumEngine::from_env`].
    pub fn pdfium() -> Self {
        Self::new(Arc::new(PdfiumEngine::from_env()))
    }

    /// Report job progress to `callback` as well as to the registry.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    // ── Registry-level jobs ──────────────────────────────────────────────

    /// Compose every image entry of `registry`, in insertion order, into one PDF.
    ///
    /// On success each image entry is `completed` and carries the combined
    /// PDF as its result.
    ///
    /// # Errors
    /// * [`ConvertError::NoInput`] — the registry holds no images
    /// * [`ConvertError::JobInProgress`] — another job holds the registry
    /// * any pipeline error; every image entry is then marked `error`
    pub async fn images_to_pdf(
        &self,
        registry: &mut FileRegistry,
        config: &ImageToPdfConfig,
    ) -> Result<Artifact, ConvertError> {
        config.validate()?;
        let entries = snapshot(registry, FileKind::Image);
        if entries.is_empty() {
            return Err(ConvertError::NoInput(FileKind::Image));
        }

        let job = Arc::new(JobController::begin(
            Arc::clone(registry.progress()),
            self.callback.clone(),
        )?);
        mark_all(registry, &entries, FileStatus::Processing)?;

        let start = Instant::now();
        let images = entries.iter().map(|e| Arc::clone(&e.data)).collect();
        let result = compose::compose_pdf(
            Arc::clone(&self.engine),
            images,
            config.clone(),
            Arc::clone(&job),
        )
        .await;

        match result {
            Ok(bytes) => {
                job.finish();
                let artifact = Artifact::pdf(bytes);
                mark_all(registry, &entries, FileStatus::Completed(vec![artifact.clone()]))?;
                info!(
                    "Converted {} images → {} ({} bytes) in {}ms",
                    entries.len(),
                    artifact.file_name,
                    artifact.len(),
                    start.elapsed().as_millis()
                );
                Ok(artifact)
            }
            Err(e) => {
                let culprit = image_culprit(&e);
                fail_job(registry, &job, &entries, culprit, e)
            }
        }
    }

    /// Rasterise the registry's single document entry.
    ///
    /// # Errors
    /// * [`ConvertError::NoInput`] — the registry holds no document
    /// * [`ConvertError::MultipleDocuments`] — more than one; use
    ///   [`Converter::pdf_to_images_for`] to pick one
    /// * everything [`Converter::pdf_to_images_for`] returns
    pub async fn pdf_to_images(
        &self,
        registry: &mut FileRegistry,
        config: &PdfToImageConfig,
    ) -> Result<Vec<Artifact>, ConvertError> {
        let ids: Vec<FileId> = registry
            .files_of_kind(FileKind::Document)
            .map(|f| f.id())
            .collect();
        match ids.as_slice() {
            [] => Err(ConvertError::NoInput(FileKind::Document)),
            [id] => self.pdf_to_images_for(registry, *id, config).await,
            _ => Err(ConvertError::MultipleDocuments { count: ids.len() }),
        }
    }

    /// Rasterise the document entry `id`, one artifact per page.
    ///
    /// On success the entry is `completed` and carries the page rasters.
    pub async fn pdf_to_images_for(
        &self,
        registry: &mut FileRegistry,
        id: FileId,
        config: &PdfToImageConfig,
    ) -> Result<Vec<Artifact>, ConvertError> {
        config.validate()?;
        let file = registry.get(id).ok_or(ConvertError::EntryNotFound { id })?;
        if file.kind() != FileKind::Document {
            return Err(ConvertError::WrongKind {
                id,
                expected: FileKind::Document,
            });
        }
        let entries = vec![JobEntry {
            id,
            name: file.name().to_string(),
            data: Arc::clone(file.data()),
        }];

        let job = Arc::new(JobController::begin(
            Arc::clone(registry.progress()),
            self.callback.clone(),
        )?);
        mark_all(registry, &entries, FileStatus::Processing)?;

        let start = Instant::now();
        let result = raster::rasterise_pdf(
            Arc::clone(&self.engine),
            Arc::clone(&entries[0].data),
            config.clone(),
            Arc::clone(&job),
        )
        .await;

        match result {
            Ok(pages) => {
                job.finish();
                mark_all(registry, &entries, FileStatus::Completed(pages.clone()))?;
                info!(
                    "Converted '{}' → {} {} pages in {}ms",
                    entries[0].name,
                    pages.len(),
                    config.format,
                    start.elapsed().as_millis()
                );
                Ok(pages)
            }
            // Any failure of a single-document job is that document's.
            Err(e) => fail_job(registry, &job, &entries, Some(0), e),
        }
    }

    // ── Raw-blob jobs ────────────────────────────────────────────────────

    /// Compose `images` into one PDF without touching any registry.
    pub async fn convert_images(
        &self,
        images: Vec<Arc<[u8]>>,
        config: &ImageToPdfConfig,
    ) -> Result<Artifact, ConvertError> {
        let job = Arc::new(JobController::detached(self.callback.clone()));
        let result =
            compose::compose_pdf(Arc::clone(&self.engine), images, config.clone(), Arc::clone(&job))
                .await;
        match result {
            Ok(bytes) => {
                job.finish();
                Ok(Artifact::pdf(bytes))
            }
            Err(e) => {
                job.fail(&e);
                Err(e)
            }
        }
    }

    /// Rasterise `pdf` without touching any registry.
    pub async fn convert_pdf(
        &self,
        pdf: Arc<[u8]>,
        config: &PdfToImageConfig,
    ) -> Result<Vec<Artifact>, ConvertError> {
        let job = Arc::new(JobController::detached(self.callback.clone()));
        let result =
            raster::rasterise_pdf(Arc::clone(&self.engine), pdf, config.clone(), Arc::clone(&job))
                .await;
        match result {
            Ok(pages) => {
                job.finish();
                Ok(pages)
            }
            Err(e) => {
                job.fail(&e);
                Err(e)
            }
        }
    }
}

fn snapshot(registry: &FileRegistry, kind: FileKind) -> Vec<JobEntry> {
    registry
        .files_of_kind(kind)
        .map(|f| JobEntry {
            id: f.id(),
            name: f.name().to_string(),
            data: Arc::clone(f.data()),
        })
        .collect()
}

fn mark_all(
    registry: &mut FileRegistry,
    entries: &[JobEntry],
    status: FileStatus,
) -> Result<(), ConvertError> {
    for entry in entries {
        registry.update_file_status(entry.id, status.clone())?;
    }
    Ok(())
}

/// Job-order index of the image that caused `error`, if one did.
fn image_culprit(error: &ConvertError) -> Option<usize> {
    match *error {
        ConvertError::Decode { index, .. } => Some(index),
        ConvertError::Render { page, .. } if page > 0 => Some(page - 1),
        _ => None,
    }
}

/// Per-entry messages for a job that aborted with `error`.
fn item_errors(entries: &[JobEntry], culprit: Option<usize>, error: &ConvertError) -> Vec<ItemError> {
    let failed = |name: &str| ItemError::Failed {
        name: name.to_string(),
        detail: error.to_string(),
    };
    match culprit.and_then(|i| entries.get(i)) {
        Some(guilty) => entries
            .iter()
            .map(|e| {
                if e.id == guilty.id {
                    failed(&e.name)
                } else {
                    ItemError::Aborted {
                        culprit: guilty.name.clone(),
                    }
                }
            })
            .collect(),
        None => entries.iter().map(|e| failed(&e.name)).collect(),
    }
}

fn fail_job<T>(
    registry: &mut FileRegistry,
    job: &JobController,
    entries: &[JobEntry],
    culprit: Option<usize>,
    error: ConvertError,
) -> Result<T, ConvertError> {
    error!("Conversion failed: {}", error);
    job.fail(&error);
    for (entry, item_error) in entries.iter().zip(item_errors(entries, culprit, &error)) {
        registry.update_file_status(entry.id, FileStatus::Error(item_error))?;
    }
    Err(error)
}
