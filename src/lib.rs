//! # pages2pdf
//!
//! Download the page scans of a book from a web archive that serves them
//! at sequentially numbered URLs, and bind them into a single PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base URL + page{index:04}_5.jpg
//!  │
//!  ├─ 1. Enumerate  pages 1..=N → (url, local path)
//!  ├─ 2. Fetch      reuse the local file, or GET with up to 3 attempts
//!  │                (random 0.5–1 s pause between pages)
//!  └─ 3. Assemble   only if every page is present: decode → RGB → PDF
//! ```
//!
//! Pages that fail are reported but do not stop the run; the PDF is simply
//! not written. Re-running resumes: pages already on disk are not requested
//! again.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pages2pdf::{acquire, DownloadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DownloadConfig::builder()
//!         .base_url("https://example.org/book/pages/")
//!         .page_count(120)
//!         .output_dir("my_book")
//!         .build()?;
//!     let report = acquire(&config).await?;
//!     eprintln!(
//!         "{} cached, {} downloaded, {} failed",
//!         report.stats.cached_pages, report.stats.downloaded_pages, report.stats.failed_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pages2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod acquire;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use acquire::{acquire, acquire_sync};
pub use config::{DownloadConfig, DownloadConfigBuilder, PagePattern};
pub use error::{FetchError, PageError, Pages2PdfError};
pub use output::{AssemblyOutcome, PageResult, PageStatus, RunReport, RunStats};
pub use pipeline::assemble::assemble;
pub use pipeline::enumerate::PageTask;
pub use pipeline::fetch::{FetchOutcome, Fetcher};
pub use progress::{DownloadProgressCallback, NoopProgressCallback, ProgressCallback};
