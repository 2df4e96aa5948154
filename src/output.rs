//! Result types produced by a download run.

use crate::error::{PageError, Pages2PdfError};
use crate::pipeline::enumerate::PageTask;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a single page was resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PageStatus {
    /// The file already existed locally; no request was made.
    Cached,
    /// Downloaded in this run.
    Downloaded { attempts: u32, bytes: u64 },
    /// Every attempt failed.
    Failed { error: PageError },
}

/// Outcome for one page of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub task: PageTask,
    pub status: PageStatus,
}

impl PageResult {
    /// `true` if the page file is available locally after this run.
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, PageStatus::Failed { .. })
    }
}

/// What happened when the obtained pages were bound into a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyOutcome {
    /// The PDF was written with one page per input image.
    Written { path: PathBuf, pages: usize },
    /// No input images; nothing was written.
    NoPages,
    /// An image could not be opened or decoded; nothing was written.
    DecodeFailed { path: PathBuf, detail: String },
}

impl AssemblyOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, AssemblyOutcome::Written { .. })
    }
}

/// Counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_pages: u32,
    pub cached_pages: u32,
    pub downloaded_pages: u32,
    pub failed_pages: u32,
    /// Bytes written for pages downloaded in this run.
    pub bytes_downloaded: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per page index, in index order.
    pub pages: Vec<PageResult>,
    /// Local paths of every obtained page, in index order.
    pub page_list: Vec<PathBuf>,
    /// `true` when every page was cached or downloaded.
    pub all_obtained: bool,
    /// `None` when assembly was skipped because pages were missing.
    pub assembly: Option<AssemblyOutcome>,
    pub stats: RunStats,
}

impl RunReport {
    /// Path of the written PDF, if one was produced.
    pub fn document_path(&self) -> Option<&Path> {
        match &self.assembly {
            Some(AssemblyOutcome::Written { path, .. }) => Some(path),
            _ => None,
        }
    }

    /// Turn a run with missing pages into an error.
    pub fn into_result(self) -> Result<Self, Pages2PdfError> {
        if self.all_obtained {
            return Ok(self);
        }
        let total = self.pages.len();
        let obtained = self.page_list.len();
        Err(Pages2PdfError::PartialFailure {
            obtained,
            failed: total - obtained,
            total,
        })
    }
}
