//! Produced files.
//!
//! Every job yields [`Artifact`]s: a suggested file name, a MIME type, and the
//! bytes. Image→PDF yields one `converted_images.pdf`; PDF→images yields
//! `page_1.png`, `page_2.png`, … in page order.

use crate::config::RasterFormat;
use crate::error::ConvertError;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Suggested name of the combined document.
pub const COMBINED_PDF_NAME: &str = "converted_images.pdf";

/// One produced file.
///
/// The bytes are reference-counted: the same combined PDF is attached to every
/// image entry of a job without being copied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: String,
    #[serde(rename = "size", serialize_with = "serialize_len")]
    pub data: Arc<[u8]>,
}

fn serialize_len<S: Serializer>(data: &Arc<[u8]>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(data.len() as u64)
}

impl Artifact {
    /// The combined PDF of an image→PDF job.
    pub fn pdf(data: Vec<u8>) -> Self {
        Self {
            file_name: COMBINED_PDF_NAME.to_string(),
            mime_type: "application/pdf".to_string(),
            data: data.into(),
        }
    }

    /// The raster of page `page_num` (1-indexed).
    pub fn page(page_num: usize, format: RasterFormat, data: Vec<u8>) -> Self {
        Self {
            file_name: page_file_name(page_num, format),
            mime_type: format.mime_type().to_string(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the artifact into `dir` under its suggested name.
    ///
    /// Uses atomic write (temp file in the same directory + rename) so a
    /// crash never leaves a truncated output behind.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        let path = dir.as_ref().join(&self.file_name);
        self.write_to_path(&path)?;
        Ok(path)
    }

    /// Write the artifact to `path` atomically.
    pub fn write_to_path(&self, path: &Path) -> Result<(), ConvertError> {
        let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(&self.data).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} bytes → {}", self.data.len(), path.display());
        Ok(())
    }
}

/// `page_<n>.<ext>` with a 1-based page number.
pub fn page_file_name(page_num: usize, format: RasterFormat) -> String {
    format!("page_{}.{}", page_num, format.extension())
}
