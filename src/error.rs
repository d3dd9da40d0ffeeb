//! Error types for the imgpdf library.
//!
//! Two error types reflect two audiences:
//!
//! * [`ConvertError`] — **Fatal** for a job: the conversion cannot produce its
//!   output (undecodable image, corrupt PDF, engine missing, bad config).
//!   Returned as `Err(ConvertError)` from the pipeline and `convert*` functions.
//!
//! * [`ItemError`] — the human-readable message attached to a tracked file
//!   once its job failed. Stored inside [`crate::registry::FileStatus::Error`]
//!   so the UI can show an inline message per entry.
//!
//! Every job is fail-fast: the first [`ConvertError`] aborts the job and no
//! partial output is returned.

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::{FileId, FileKind};

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input blob is not a valid image or PDF.
    Decode,
    /// The engine rejected a valid input.
    Render,
    /// The runtime could not allocate an intermediate surface or bind the engine.
    Resource,
    /// The caller asked for something the library refuses to do.
    Usage,
}

/// All fatal errors returned by the imgpdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input `index` (0-based, job order) could not be decoded.
    #[error("Input {index} could not be decoded: {detail}")]
    Decode { index: usize, detail: String },

    /// A document input does not start with the `%PDF` magic bytes.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The engine rejected page `page` (1-based).
    #[error("Rendering failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// The engine could not allocate the intermediate surface.
    #[error("Could not allocate rendering surface: {detail}")]
    Resource { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the executable."
    )]
    EngineUnavailable(String),

    // ── Usage errors ──────────────────────────────────────────────────────
    /// The job has nothing to convert.
    #[error("Nothing to convert: no {0} files selected")]
    NoInput(FileKind),

    /// More than one document was selected for a single-document job.
    #[error("{count} documents selected; convert one document at a time")]
    MultipleDocuments { count: usize },

    /// A conversion is already running against this registry.
    #[error("A conversion is already in progress")]
    JobInProgress,

    /// No tracked file carries the given id.
    #[error("No tracked file with id {id}")]
    EntryNotFound { id: FileId },

    /// The tracked file exists but has the wrong kind for this job.
    #[error("File {id} is not a {expected} file")]
    WrongKind { id: FileId, expected: FileKind },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Classify this error into the decode / render / resource taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Decode { .. } | ConvertError::NotAPdf { .. } => ErrorKind::Decode,
            ConvertError::Render { .. } => ErrorKind::Render,
            ConvertError::Resource { .. }
            | ConvertError::EngineUnavailable(_)
            | ConvertError::OutputWriteFailed { .. }
            | ConvertError::Internal(_) => ErrorKind::Resource,
            ConvertError::NoInput(_)
            | ConvertError::MultipleDocuments { .. }
            | ConvertError::JobInProgress
            | ConvertError::EntryNotFound { .. }
            | ConvertError::WrongKind { .. }
            | ConvertError::InvalidConfig(_) => ErrorKind::Usage,
        }
    }
}

/// Message attached to a tracked file whose job failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// This file caused the failure.
    #[error("Failed to convert {name}: {detail}")]
    Failed { name: String, detail: String },

    /// Another file in the same job failed; this one was not converted.
    #[error("Conversion aborted because {culprit} failed")]
    Aborted { culprit: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display_names_index() {
        let e = ConvertError::Decode {
            index: 2,
            detail: "bad header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Input 2"), "got: {msg}");
        assert!(msg.contains("bad header"));
        assert_eq!(e.kind(), ErrorKind::Decode);
    }

    #[test]
    fn not_a_pdf_is_decode_kind() {
        let e = ConvertError::NotAPdf {
            magic: b"GIF8".to_vec(),
        };
        assert_eq!(e.kind(), ErrorKind::Decode);
    }

    #[test]
    fn render_and_resource_kinds() {
        let render = ConvertError::Render {
            page: 4,
            detail: "unsupported".into(),
        };
        assert!(render.to_string().contains("page 4"));
        assert_eq!(render.kind(), ErrorKind::Render);

        let resource = ConvertError::Resource {
            detail: "40000x40000 px".into(),
        };
        assert_eq!(resource.kind(), ErrorKind::Resource);
    }

    #[test]
    fn multiple_documents_display() {
        let e = ConvertError::MultipleDocuments { count: 3 };
        assert!(e.to_string().contains('3'));
        assert_eq!(e.kind(), ErrorKind::Usage);
    }

    #[test]
    fn item_error_messages_are_not_empty() {
        let failed = ItemError::Failed {
            name: "b.png".into(),
            detail: "truncated".into(),
        };
        assert!(failed.to_string().contains("b.png"));

        let aborted = ItemError::Aborted {
            culprit: "b.png".into(),
        };
        assert!(aborted.to_string().contains("aborted"));
    }
}
