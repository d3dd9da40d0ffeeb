//! # imgpdf
//!
//! Convert images into one PDF, and PDFs into one image per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images ──┬─ 1. Decode   any supported format → pixels, re-encoded as JPEG
//!          ├─ 2. Layout   fit width, else fit height, centre on the page
//!          └─ 3. Compose  one page per image via pdfium (spawn_blocking)
//!                          → converted_images.pdf
//!
//! PDF ─────┬─ 1. Parse    page count + intrinsic page sizes
//!          ├─ 2. Render   page × (dpi / 72) via pdfium (spawn_blocking)
//!          └─ 3. Encode   PNG / JPEG / WEBP
//!                          → page_1.png, page_2.png, …
//! ```
//!
//! Both pipelines work strictly in input order and report progress after
//! every item. A [`FileRegistry`] tracks uploaded files and their status; a
//! [`Converter`] runs jobs against it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgpdf::{Converter, FileKind, FileRegistry, ImageToPdfConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = FileRegistry::new();
//!     registry.add_files(
//!         vec![
//!             ("a.png", std::fs::read("a.png")?),
//!             ("b.jpg", std::fs::read("b.jpg")?),
//!         ],
//!         FileKind::Image,
//!     );
//!
//!     let pdf = Converter::pdfium()
//!         .images_to_pdf(&mut registry, &ImageToPdfConfig::default())
//!         .await?;
//!     pdf.write_to_dir(".")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgpdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! imgpdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirement
//!
//! [`PdfiumEngine`] loads the pdfium shared library at job time. Point
//! `PDFIUM_LIB_PATH` at it, place it in the working directory, or install it
//! system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod registry;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ImageToPdfConfig, ImageToPdfConfigBuilder, Orientation, PageGeometry, PageSize,
    PdfToImageConfig, PdfToImageConfigBuilder, RasterFormat,
};
pub use convert::Converter;
pub use engine::{PdfComposer, PdfEngine, PdfPages, PdfiumEngine};
pub use error::{ConvertError, ErrorKind, ItemError};
pub use job::JobController;
pub use output::Artifact;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{
    FileId, FileKind, FileRegistry, FileStatus, FileSummary, PreviewHandle, PreviewStore,
    TrackedFile,
};
