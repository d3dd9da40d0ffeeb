//! Pipeline stages for both conversion directions.
//!
//! Each submodule implements one transformation step, so each can be tested
//! without a PDF engine.
//!
//! ## Data Flow
//!
//! ```text
//! images ──▶ decode ──▶ layout ──▶ compose ──▶ PDF bytes
//!            (JPEG)     (fit)      (engine)
//!
//! PDF ──▶ raster ──▶ encode ──▶ page_1.png, page_2.png, …
//!         (engine)   (png/jpeg/webp)
//! ```
//!
//! 1. [`decode`]  — decode an uploaded image and re-encode it as JPEG at the
//!    requested quality
//! 2. [`layout`]  — fit an image inside the page, preserving aspect ratio,
//!    centred on both axes
//! 3. [`compose`] — the image→PDF job: one page per image, in input order
//! 4. [`raster`]  — the PDF→image job: one raster per page, in page order
//! 5. [`encode`]  — encode a raster to the requested output format
//!
//! Both jobs run on `spawn_blocking` because pdfium is blocking and
//! CPU-bound, and both process strictly one item at a time so progress only
//! ever moves forward.

pub mod compose;
pub mod decode;
pub mod encode;
pub mod layout;
pub mod raster;
