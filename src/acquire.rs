//! Top-level run: enumerate → fetch or reuse → assemble.
//!
//! Pages are resolved strictly one after another. A page whose file already
//! exists locally is trusted and never requested again, which makes a
//! second run over a finished directory free of network traffic and lets
//! an interrupted run pick up where it stopped.

use crate::config::DownloadConfig;
use crate::error::{PageError, Pages2PdfError};
use crate::output::{PageResult, PageStatus, RunReport, RunStats};
use crate::pipeline::assemble::assemble;
use crate::pipeline::enumerate::page_tasks;
use crate::pipeline::fetch::{FetchOutcome, Fetcher};
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info};

/// Download every configured page and, if all are present, build the PDF.
///
/// Missing pages are not an error: the report says which pages failed and
/// `assembly` is `None`. `Err` means a filesystem or configuration problem
/// that stopped the run.
///
/// # Example
/// ```rust,no_run
/// use pages2pdf::{acquire, DownloadConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DownloadConfig::builder()
///     .base_url("https://example.org/pages/")
///     .page_count(3)
///     .build()?;
/// let report = acquire(&config).await?;
/// if let Some(pdf) = report.document_path() {
///     println!("wrote {}", pdf.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn acquire(config: &DownloadConfig) -> Result<RunReport, Pages2PdfError> {
    let start = Instant::now();

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Pages2PdfError::CreateDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    let fetcher = Fetcher::new(config)?;
    let total = config.page_count;
    let cb = config.progress_callback.as_ref();

    info!(
        "Resolving {} pages into {} (up to {} attempts each)",
        total,
        config.output_dir.display(),
        fetcher.max_attempts()
    );
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }

    let mut pages = Vec::with_capacity(total as usize);
    let mut page_list = Vec::with_capacity(total as usize);
    let mut all_obtained = true;
    let mut stats = RunStats {
        total_pages: total,
        ..RunStats::default()
    };
    let mut fetched_before = false;

    for task in page_tasks(config) {
        let cached = tokio::fs::try_exists(&task.local_path).await.map_err(|e| {
            Pages2PdfError::PageCheckFailed {
                path: task.local_path.clone(),
                source: e,
            }
        })?;
        if cached {
            info!(
                "File already exists: {}, skipping download",
                task.local_path.display()
            );
            if let Some(cb) = cb {
                cb.on_page_cached(task.index, total);
            }
            stats.cached_pages += 1;
            page_list.push(task.local_path.clone());
            pages.push(PageResult {
                task,
                status: PageStatus::Cached,
            });
            continue;
        }

        // Throttle between page requests, never between retries of one page.
        if fetched_before {
            pause(config).await;
        }
        fetched_before = true;

        if let Some(cb) = cb {
            cb.on_page_start(task.index, total);
        }

        let status = match fetcher.fetch(&task.remote_url, &task.local_path).await? {
            FetchOutcome::Saved { attempts, bytes } => {
                if let Some(cb) = cb {
                    cb.on_page_saved(task.index, total, bytes);
                }
                stats.downloaded_pages += 1;
                stats.bytes_downloaded += bytes;
                page_list.push(task.local_path.clone());
                PageStatus::Downloaded { attempts, bytes }
            }
            FetchOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                let error = PageError::DownloadFailed {
                    page: task.index,
                    url: task.remote_url.clone(),
                    attempts,
                    last_error,
                };
                if let Some(cb) = cb {
                    cb.on_page_failed(task.index, total, &error.to_string());
                }
                stats.failed_pages += 1;
                all_obtained = false;
                PageStatus::Failed { error }
            }
        };
        pages.push(PageResult { task, status });
    }

    if let Some(cb) = cb {
        cb.on_run_complete(total, page_list.len() as u32);
    }

    let assembly = if all_obtained {
        let outcome = assemble(&page_list, &config.output_path(), config.jpeg_quality).await?;
        if !outcome.is_written() {
            error!("PDF document was not created: {:?}", outcome);
        }
        Some(outcome)
    } else {
        error!(
            "{} of {} pages were not downloaded; PDF document not created",
            stats.failed_pages, total
        );
        None
    };

    stats.total_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Run finished: {} cached, {} downloaded, {} failed in {}ms",
        stats.cached_pages, stats.downloaded_pages, stats.failed_pages, stats.total_duration_ms
    );

    Ok(RunReport {
        pages,
        page_list,
        all_obtained,
        assembly,
        stats,
    })
}

/// Synchronous wrapper around [`acquire`].
///
/// Creates a single-threaded tokio runtime internally.
pub fn acquire_sync(config: &DownloadConfig) -> Result<RunReport, Pages2PdfError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Pages2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(acquire(config))
}

/// Sleep for a uniformly random duration in the configured pause range.
async fn pause(config: &DownloadConfig) {
    let ms = pause_ms(config.pause_min_ms, config.pause_max_ms);
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}

fn pause_ms(min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}
