//! Progress-callback trait for per-page download events.
//!
//! Inject an [`Arc<dyn DownloadProgressCallback>`] via
//! [`crate::config::DownloadConfigBuilder::progress_callback`] to receive
//! events as the run resolves each page. The CLI uses this to drive its
//! progress bar; library callers can forward events anywhere they like.
//!
//! # Example
//!
//! ```rust
//! use pages2pdf::{DownloadConfig, DownloadProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SavedCounter(AtomicUsize);
//!
//! impl DownloadProgressCallback for SavedCounter {
//!     fn on_page_saved(&self, index: u32, total: u32, bytes: u64) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {index}/{total}: {bytes} bytes");
//!     }
//! }
//!
//! let config = DownloadConfig::builder()
//!     .progress_callback(Arc::new(SavedCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it resolves each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are resolved strictly in index order.
pub trait DownloadProgressCallback: Send + Sync {
    /// Called once before the first page is looked at.
    fn on_run_start(&self, total_pages: u32) {
        let _ = total_pages;
    }

    /// The page file already existed locally and is reused as-is.
    fn on_page_cached(&self, index: u32, total_pages: u32) {
        let _ = (index, total_pages);
    }

    /// Called just before the first HTTP attempt for a page.
    fn on_page_start(&self, index: u32, total_pages: u32) {
        let _ = (index, total_pages);
    }

    /// The page was downloaded and written to disk.
    ///
    /// # Arguments
    /// * `bytes`: size of the saved image file
    fn on_page_saved(&self, index: u32, total_pages: u32, bytes: u64) {
        let _ = (index, total_pages, bytes);
    }

    /// Every attempt for the page failed.
    fn on_page_failed(&self, index: u32, total_pages: u32, error: &str) {
        let _ = (index, total_pages, error);
    }

    /// Called once after every page has been resolved, before assembly.
    ///
    /// # Arguments
    /// * `obtained`: pages that were cached or downloaded
    fn on_run_complete(&self, total_pages: u32, obtained: u32) {
        let _ = (total_pages, obtained);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DownloadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DownloadConfig`].
pub type ProgressCallback = Arc<dyn DownloadProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        cached: AtomicU32,
        saved: AtomicU32,
        failed: AtomicU32,
        obtained: AtomicU32,
    }

    impl DownloadProgressCallback for TrackingCallback {
        fn on_page_cached(&self, _index: u32, _total: u32) {
            self.cached.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_saved(&self, _index: u32, _total: u32, _bytes: u64) {
            self.saved.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_failed(&self, _index: u32, _total: u32, _error: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: u32, obtained: u32) {
            self.obtained.store(obtained, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(3);
        cb.on_page_cached(1, 3);
        cb.on_page_start(2, 3);
        cb.on_page_saved(2, 3, 1024);
        cb.on_page_failed(3, 3, "HTTP 404");
        cb.on_run_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_run_start(3);
        tracker.on_page_cached(1, 3);
        tracker.on_page_start(2, 3);
        tracker.on_page_saved(2, 3, 2048);
        tracker.on_page_start(3, 3);
        tracker.on_page_failed(3, 3, "HTTP 500");
        tracker.on_run_complete(3, 2);

        assert_eq!(tracker.cached.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.saved.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.obtained.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_page_saved(1, 10, 512);
    }
}
