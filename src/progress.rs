//! Progress reporting for conversion jobs.
//!
//! Two pieces cooperate here:
//!
//! * [`JobProgress`] — the single 0–100 scalar a UI polls, plus the
//!   "is a job running" flag. One instance lives in each
//!   [`crate::registry::FileRegistry`].
//! * [`ConversionProgressCallback`] — optional push-style events for callers
//!   that want to drive a progress bar or log per-item completion.
//!
//! Both are fed by a [`crate::job::JobController`], which is created per
//! conversion request and passed explicitly to the pipeline.
//!
//! # Example
//!
//! ```rust
//! use imgpdf::{ConversionProgressCallback, ProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, item_num: usize, total_items: usize, percent: u8) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{item_num}/{total_items} done ({percent}%)");
//!     }
//! }
//!
//! let cb: ProgressCallback = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//! cb.on_item_complete(1, 4, 25);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Called by a conversion job as it processes each item (image or page).
///
/// Implementations must be `Send + Sync`: the pdfium work runs on a blocking
/// thread, so events arrive from there. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first item is processed.
    ///
    /// # Arguments
    /// * `total_items` — images to compose, or pages to rasterise
    fn on_conversion_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called after each item completes.
    ///
    /// # Arguments
    /// * `item_num`    — 1-indexed item number
    /// * `total_items` — total items in the job
    /// * `percent`     — `round(100 * item_num / total_items)`
    fn on_item_complete(&self, item_num: usize, total_items: usize, percent: u8) {
        let _ = (item_num, total_items, percent);
    }

    /// Called once after the last item succeeded.
    fn on_conversion_complete(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called once when the job aborts.
    fn on_conversion_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Shared handle type for progress callbacks.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Percentage of `done` out of `total`, rounded to the nearest integer.
///
/// An empty job counts as complete.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total) as f64;
    (100.0 * done / total as f64).round() as u8
}

/// The progress scalar and single-flight flag of one registry.
///
/// Progress is reset to 0 when a job begins and only ever moves forward
/// while that job runs.
#[derive(Debug, Default)]
pub struct JobProgress {
    percent: AtomicU8,
    converting: AtomicBool,
}

impl JobProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress, 0–100.
    pub fn get(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }

    /// Whether a job currently holds this progress slot.
    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::SeqCst)
    }

    /// Reset to 0.
    pub fn reset(&self) {
        self.percent.store(0, Ordering::SeqCst);
    }

    /// Move progress forward to `value`; lower values are ignored.
    pub fn advance(&self, value: u8) {
        self.percent.fetch_max(value.min(100), Ordering::SeqCst);
    }

    /// Claim the single-flight slot. Returns `false` if a job already holds it.
    pub(crate) fn try_claim(&self) -> bool {
        self.converting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.converting.store(false, Ordering::SeqCst);
    }
}
