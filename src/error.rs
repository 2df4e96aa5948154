//! Error types for the pages2pdf library.
//!
//! Three error types cover three failure scopes:
//!
//! * [`Pages2PdfError`]: **Fatal**: the run cannot continue (invalid
//!   configuration, the working directory cannot be created, a file cannot
//!   be written). Returned as `Err(Pages2PdfError)` from [`crate::acquire`].
//!
//! * [`PageError`]: **Non-fatal**: one page could not be obtained after
//!   every attempt. Stored inside [`crate::output::PageResult`]; the run
//!   moves on to the next page and only the final assembly is skipped.
//!
//! * [`FetchError`]: why a single HTTP attempt failed. Carried by
//!   [`PageError`] as the last error seen before the attempt budget ran out.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pages2pdf library.
#[derive(Debug, Error)]
pub enum Pages2PdfError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed (TLS backend, bad header value).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The working directory could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Whether a page is already on disk could not be determined.
    #[error("Failed to check for existing page '{path}': {source}")]
    PageCheckFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A downloaded page image could not be written to disk.
    #[error("Failed to write page image '{path}': {source}")]
    PageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The assembled PDF could not be written to disk.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF object graph could not be serialised.
    #[error("Failed to build PDF '{path}': {detail}")]
    PdfBuildFailed { path: PathBuf, detail: String },

    // ── Run outcome ───────────────────────────────────────────────────────
    /// Some pages were obtained but at least one was not.
    ///
    /// Returned by [`crate::output::RunReport::into_result`] when the caller
    /// wants to treat any missing page as an error.
    #[error("{failed}/{total} pages could not be downloaded; PDF not created")]
    PartialFailure {
        obtained: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single HTTP attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// No complete response within the request timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// DNS, connect, TLS or body-read failure.
    #[error("transport error: {detail}")]
    Transport { detail: String },
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Every attempt to download the page failed.
    #[error("Page {page}: not downloaded after {attempts} attempts ({last_error}): {url}")]
    DownloadFailed {
        page: u32,
        url: String,
        attempts: u32,
        last_error: FetchError,
    },
}
