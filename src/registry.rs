//! Tracked files and their lifecycle.
//!
//! A [`FileRegistry`] owns every uploaded file, in insertion order, together
//! with the resources derived from it: a [`PreviewHandle`] for images, and the
//! produced [`Artifact`]s once a job completes.
//!
//! ## Status machine
//!
//! ```text
//!   Idle ──▶ Processing ──▶ Completed
//!                 │
//!                 └──────▶ Error
//! ```
//!
//! `Processing` is reachable from every state, so a failed or completed file
//! can simply be converted again. Nothing ever moves back to `Idle`.
//!
//! ## Preview ownership
//!
//! Each image entry owns exactly one preview handle. The handle revokes its
//! URI from the [`PreviewStore`] when dropped, which happens when the entry
//! leaves the registry through [`FileRegistry::remove_file`] or
//! [`FileRegistry::clear_files`]. Ownership makes leaks and double releases
//! unrepresentable; the store's counters let tests observe both.

use crate::error::{ConvertError, ItemError};
use crate::output::Artifact;
use crate::progress::JobProgress;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque, stable identifier of a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What a tracked file contains. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileKind::Image => "image",
            FileKind::Document => "document",
        })
    }
}

/// Lifecycle state of a tracked file.
///
/// Results and error messages live inside the variant that owns them, so a
/// file can never carry both, nor carry either while idle or processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum FileStatus {
    Idle,
    Processing,
    Completed(Vec<Artifact>),
    Error(ItemError),
}

impl FileStatus {
    pub fn name(&self) -> &'static str {
        match self {
            FileStatus::Idle => "idle",
            FileStatus::Processing => "processing",
            FileStatus::Completed(_) => "completed",
            FileStatus::Error(_) => "error",
        }
    }

    pub fn result(&self) -> Option<&[Artifact]> {
        match self {
            FileStatus::Completed(artifacts) => Some(artifacts),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ItemError> {
        match self {
            FileStatus::Error(e) => Some(e),
            _ => None,
        }
    }
}

// ── Previews ─────────────────────────────────────────────────────────────

/// Issues and revokes preview URIs that reference raw image bytes.
///
/// The store shares the entry's byte buffer rather than copying it.
#[derive(Debug, Default)]
pub struct PreviewStore {
    live: Mutex<HashMap<String, Arc<[u8]>>>,
    issued: AtomicUsize,
    revoked: AtomicUsize,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return the handle that owns its URI.
    pub fn create(self: &Arc<Self>, data: Arc<[u8]>) -> PreviewHandle {
        let uri = format!("blob:imgpdf/{}", Uuid::new_v4());
        self.lock_live().insert(uri.clone(), data);
        self.issued.fetch_add(1, Ordering::SeqCst);
        PreviewHandle {
            uri,
            store: Arc::clone(self),
        }
    }

    /// Bytes behind a live URI.
    pub fn resolve(&self, uri: &str) -> Option<Arc<[u8]>> {
        self.lock_live().get(uri).cloned()
    }

    /// Number of URIs currently live.
    pub fn live_count(&self) -> usize {
        self.lock_live().len()
    }

    /// Total URIs issued since the store was created.
    pub fn issued_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Total URIs revoked since the store was created.
    pub fn revoked_count(&self) -> usize {
        self.revoked.load(Ordering::SeqCst)
    }

    fn revoke(&self, uri: &str) {
        if self.lock_live().remove(uri).is_some() {
            self.revoked.fetch_add(1, Ordering::SeqCst);
        } else {
            warn!("Preview {} revoked twice", uri);
        }
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        // A poisoned map is still structurally valid.
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Displayable reference to an image entry's raw bytes.
///
/// Revoked from its store exactly once, on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    uri: String,
    store: Arc<PreviewStore>,
}

impl PreviewHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Render the preview as a `data:` URI for front ends that cannot resolve
    /// `blob:` URIs.
    pub fn data_uri(&self) -> Option<String> {
        let bytes = self.store.resolve(&self.uri)?;
        let mime = image::guess_format(&bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Some(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.uri);
    }
}

// ── Entries ──────────────────────────────────────────────────────────────

/// One uploaded file and its derived state.
#[derive(Debug)]
pub struct TrackedFile {
    id: FileId,
    name: String,
    kind: FileKind,
    data: Arc<[u8]>,
    preview: Option<PreviewHandle>,
    status: FileStatus,
}

impl TrackedFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// The original bytes, shared and never mutated.
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn status(&self) -> &FileStatus {
        &self.status
    }
}

/// Serialisable snapshot of a tracked file, for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    pub kind: FileKind,
    pub size: usize,
    pub preview: Option<String>,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl From<&TrackedFile> for FileSummary {
    fn from(f: &TrackedFile) -> Self {
        Self {
            id: f.id,
            name: f.name.clone(),
            kind: f.kind,
            size: f.data.len(),
            preview: f.preview.as_ref().map(|p| p.uri().to_string()),
            status: f.status.clone(),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

/// Ordered collection of tracked files plus the progress slot jobs report to.
#[derive(Debug)]
pub struct FileRegistry {
    files: Vec<TrackedFile>,
    previews: Arc<PreviewStore>,
    progress: Arc<JobProgress>,
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::with_preview_store(Arc::new(PreviewStore::new()))
    }

    /// Create a registry issuing previews from an existing store.
    pub fn with_preview_store(previews: Arc<PreviewStore>) -> Self {
        Self {
            files: Vec::new(),
            previews,
            progress: Arc::new(JobProgress::new()),
        }
    }

    /// Track one new entry per blob, in order. Image entries get a preview.
    ///
    /// Returns the new ids in the same order as `blobs`.
    pub fn add_files<N, D>(&mut self, blobs: impl IntoIterator<Item = (N, D)>, kind: FileKind) -> Vec<FileId>
    where
        N: Into<String>,
        D: Into<Arc<[u8]>>,
    {
        let mut ids = Vec::new();
        for (name, data) in blobs {
            let data: Arc<[u8]> = data.into();
            let preview = match kind {
                FileKind::Image => Some(self.previews.create(Arc::clone(&data))),
                FileKind::Document => None,
            };
            let file = TrackedFile {
                id: FileId::new(),
                name: name.into(),
                kind,
                data,
                preview,
                status: FileStatus::Idle,
            };
            debug!("Tracking {} file '{}' as {}", kind, file.name, file.id);
            ids.push(file.id);
            self.files.push(file);
        }
        ids
    }

    /// Remove the entry with `id`, releasing its preview.
    ///
    /// Returns `false` (and changes nothing) if no such entry exists.
    pub fn remove_file(&mut self, id: FileId) -> bool {
        match self.files.iter().position(|f| f.id == id) {
            Some(pos) => {
                let file = self.files.remove(pos);
                debug!("Removed '{}' ({})", file.name, file.id);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, releasing every preview, and reset progress to 0.
    pub fn clear_files(&mut self) {
        let n = self.files.len();
        self.files.clear();
        self.progress.reset();
        debug!("Cleared {} files", n);
    }

    /// Move the entry with `id` to `status`.
    pub fn update_file_status(&mut self, id: FileId, status: FileStatus) -> Result<(), ConvertError> {
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(ConvertError::EntryNotFound { id })?;
        debug!("'{}': {} → {}", file.name, file.status.name(), status.name());
        file.status = status;
        Ok(())
    }

    pub fn get(&self, id: FileId) -> Option<&TrackedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// All entries in insertion order.
    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    /// Entries of one kind, in insertion order.
    pub fn files_of_kind(&self, kind: FileKind) -> impl Iterator<Item = &TrackedFile> {
        self.files.iter().filter(move |f| f.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn previews(&self) -> &Arc<PreviewStore> {
        &self.previews
    }

    /// Progress slot shared with running jobs.
    pub fn progress(&self) -> &Arc<JobProgress> {
        &self.progress
    }

    /// Current progress, 0–100.
    pub fn conversion_progress(&self) -> u8 {
        self.progress.get()
    }

    pub fn is_converting(&self) -> bool {
        self.progress.is_converting()
    }

    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files.iter().map(FileSummary::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(names: &[&str]) -> Vec<(String, Vec<u8>)> {
        names
            .iter()
            .map(|n| (n.to_string(), n.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn add_images_creates_idle_entries_with_previews() {
        let mut reg = FileRegistry::new();
        let ids = reg.add_files(blobs(&["a.png", "b.png", "c.png"]), FileKind::Image);

        assert_eq!(ids.len(), 3);
        assert_eq!(reg.len(), 3);
        let names: Vec<&str> = reg.files().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        for f in reg.files() {
            assert!(f.preview().is_some());
            assert_eq!(f.status(), &FileStatus::Idle);
        }
        assert_eq!(reg.previews().live_count(), 3);
    }

    #[test]
    fn documents_have_no_preview() {
        let mut reg = FileRegistry::new();
        reg.add_files(blobs(&["doc.pdf"]), FileKind::Document);
        assert!(reg.files()[0].preview().is_none());
        assert_eq!(reg.previews().issued_count(), 0);
    }

    #[test]
    fn ids_are_unique() {
        let mut reg = FileRegistry::new();
        let mut ids = reg.add_files(blobs(&["a", "b"]), FileKind::Image);
        ids.extend(reg.add_files(blobs(&["a", "b"]), FileKind::Document));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn preview_shares_raw_bytes() {
        let mut reg = FileRegistry::new();
        let id = reg.add_files(blobs(&["a.png"]), FileKind::Image)[0];
        let file = reg.get(id).unwrap();
        let resolved = reg.previews().resolve(file.preview().unwrap().uri()).unwrap();
        assert!(Arc::ptr_eq(&resolved, file.data()));
    }

    #[test]
    fn remove_releases_preview_exactly_once() {
        let mut reg = FileRegistry::new();
        let ids = reg.add_files(blobs(&["a.png", "b.png"]), FileKind::Image);

        assert!(reg.remove_file(ids[0]));
        assert_eq!(reg.previews().revoked_count(), 1);
        assert_eq!(reg.previews().live_count(), 1);

        assert!(!reg.remove_file(ids[0]));
        assert_eq!(reg.previews().revoked_count(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut reg = FileRegistry::new();
        reg.add_files(blobs(&["a.png"]), FileKind::Image);
        let stranger = FileRegistry::new().add_files(blobs(&["x"]), FileKind::Image)[0];
        assert!(!reg.remove_file(stranger));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.previews().revoked_count(), 0);
    }

    #[test]
    fn clear_releases_all_and_resets_progress() {
        let mut reg = FileRegistry::new();
        reg.add_files(blobs(&["a.png", "b.png"]), FileKind::Image);
        reg.progress().advance(100);

        reg.clear_files();

        assert!(reg.is_empty());
        assert_eq!(reg.previews().live_count(), 0);
        assert_eq!(reg.previews().revoked_count(), 2);
        assert_eq!(reg.conversion_progress(), 0);
    }

    #[test]
    fn status_transitions_and_processing_from_any_state() {
        let mut reg = FileRegistry::new();
        let id = reg.add_files(blobs(&["a.png"]), FileKind::Image)[0];

        reg.update_file_status(id, FileStatus::Processing).unwrap();
        reg.update_file_status(
            id,
            FileStatus::Error(ItemError::Failed {
                name: "a.png".into(),
                detail: "corrupt".into(),
            }),
        )
        .unwrap();
        assert!(reg.get(id).unwrap().status().error().is_some());
        assert!(reg.get(id).unwrap().status().result().is_none());

        reg.update_file_status(id, FileStatus::Processing).unwrap();
        reg.update_file_status(id, FileStatus::Completed(Vec::new())).unwrap();
        assert!(reg.get(id).unwrap().status().result().is_some());
        assert!(reg.get(id).unwrap().status().error().is_none());
    }

    #[test]
    fn update_unknown_id_errors() {
        let mut reg = FileRegistry::new();
        let stranger = FileRegistry::new().add_files(blobs(&["x"]), FileKind::Image)[0];
        assert!(matches!(
            reg.update_file_status(stranger, FileStatus::Processing),
            Err(ConvertError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn data_uri_embeds_base64_bytes() {
        let mut reg = FileRegistry::new();
        let id = reg.add_files(vec![("x.bin", vec![1u8, 2, 3])], FileKind::Image)[0];
        let uri = reg.get(id).unwrap().preview().unwrap().data_uri().unwrap();
        assert_eq!(uri, "data:application/octet-stream;base64,AQID");
    }

    #[test]
    fn summary_serialises_status_tag() {
        let mut reg = FileRegistry::new();
        reg.add_files(blobs(&["a.png"]), FileKind::Image);
        let json = serde_json::to_value(reg.summaries()).unwrap();
        assert_eq!(json[0]["status"], "idle");
        assert_eq!(json[0]["kind"], "image");
        assert!(json[0]["preview"].as_str().unwrap().starts_with("blob:imgpdf/"));
    }
}
