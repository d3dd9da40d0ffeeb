//! Per-request job state.
//!
//! A [`JobController`] is created for one conversion request, holds the
//! registry's single-flight slot for as long as it lives, and is the only
//! thing the pipelines report progress through.

use crate::error::ConvertError;
use crate::progress::{percent, JobProgress, ProgressCallback};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Owns progress reporting for one running job.
///
/// Dropping the controller frees the single-flight slot, whether the job
/// succeeded, failed, or panicked.
pub struct JobController {
    progress: Arc<JobProgress>,
    callback: Option<ProgressCallback>,
    total: AtomicUsize,
}

impl JobController {
    /// Claim `progress` for a new job and reset it to 0.
    ///
    /// Fails with [`ConvertError::JobInProgress`] if another controller
    /// currently holds the same progress slot.
    pub fn begin(
        progress: Arc<JobProgress>,
        callback: Option<ProgressCallback>,
    ) -> Result<Self, ConvertError> {
        if !progress.try_claim() {
            return Err(ConvertError::JobInProgress);
        }
        progress.reset();
        Ok(Self {
            progress,
            callback,
            total: AtomicUsize::new(0),
        })
    }

    /// A controller that reports only to its own private progress scalar.
    ///
    /// Used when a pipeline is driven directly, without a registry.
    pub fn detached(callback: Option<ProgressCallback>) -> Self {
        let progress = Arc::new(JobProgress::new());
        let claimed = progress.try_claim();
        debug_assert!(claimed, "fresh progress slot was already claimed");
        Self {
            progress,
            callback,
            total: AtomicUsize::new(0),
        }
    }

    /// Announce how many items the job will process.
    ///
    /// Called by the pipeline once the count is known (for PDFs, after parsing).
    pub fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        if let Some(ref cb) = self.callback {
            cb.on_conversion_start(total);
        }
        debug!("Job started: {} items", total);
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Current progress, 0–100.
    pub fn progress(&self) -> u8 {
        self.progress.get()
    }

    /// Record that item `item_num` (1-indexed) is done.
    pub fn item_done(&self, item_num: usize) {
        let total = self.total();
        let pct = percent(item_num, total);
        self.progress.advance(pct);
        if let Some(ref cb) = self.callback {
            cb.on_item_complete(item_num, total, pct);
        }
    }

    /// Record success of the whole job; progress ends at exactly 100.
    pub fn finish(&self) {
        self.progress.advance(100);
        if let Some(ref cb) = self.callback {
            cb.on_conversion_complete(self.total());
        }
    }

    /// Record that the job aborted.
    pub fn fail(&self, error: &ConvertError) {
        if let Some(ref cb) = self.callback {
            cb.on_conversion_error(&error.to_string());
        }
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.progress.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ConversionProgressCallback;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        percents: Mutex<Vec<u8>>,
        finished: Mutex<bool>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_item_complete(&self, _item_num: usize, _total_items: usize, percent: u8) {
            self.percents.lock().unwrap().push(percent);
        }

        fn on_conversion_complete(&self, _total_items: usize) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[test]
    fn detached_controller_holds_its_own_slot() {
        let job = JobController::detached(None);
        let progress = Arc::clone(&job.progress);
        assert!(progress.is_converting());
        assert!(!progress.try_claim());
        drop(job);
        assert!(!progress.is_converting());
    }

    #[test]
    fn second_job_is_refused_until_first_drops() {
        let progress = Arc::new(JobProgress::new());
        let first = JobController::begin(Arc::clone(&progress), None).unwrap();
        assert!(progress.is_converting());
        assert!(matches!(
            JobController::begin(Arc::clone(&progress), None),
            Err(ConvertError::JobInProgress)
        ));
        drop(first);
        assert!(!progress.is_converting());
        assert!(JobController::begin(progress, None).is_ok());
    }

    #[test]
    fn begin_resets_progress() {
        let progress = Arc::new(JobProgress::new());
        progress.advance(100);
        let job = JobController::begin(Arc::clone(&progress), None).unwrap();
        assert_eq!(job.progress(), 0);
    }

    #[test]
    fn reports_monotonic_percentages_ending_at_100() {
        let recorder = Arc::new(Recorder::default());
        let job = JobController::detached(Some(recorder.clone() as ProgressCallback));
        job.start(3);
        for i in 1..=3 {
            job.item_done(i);
        }
        job.finish();

        let seen = recorder.percents.lock().unwrap().clone();
        assert_eq!(seen, vec![33, 67, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(job.progress(), 100);
        assert!(*recorder.finished.lock().unwrap());
    }
}
