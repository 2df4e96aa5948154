//! Pipeline stages for turning an archive's page scans into one PDF.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the orchestrator in [`crate::acquire`] stays a plain loop.
//!
//! ## Data Flow
//!
//! ```text
//! enumerate ──▶ fetch (or reuse) ──▶ assemble
//!  (PageTask)    (HTTP + retry)      (decode → RGB → PDF)
//! ```
//!
//! 1. [`enumerate`]: expand the page range into `(url, local path)` tasks
//! 2. [`fetch`]    : GET one page with a bounded attempt budget; the only
//!    stage with network I/O
//! 3. [`assemble`] : decode every obtained image and write them as the
//!    pages of a single document; runs in `spawn_blocking` because decoding
//!    and JPEG encoding are CPU-bound

pub mod assemble;
pub mod enumerate;
pub mod fetch;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` via a `.part` sibling and a rename.
///
/// A run interrupted mid-write leaves only the `.part` file behind, never a
/// truncated file under the final name that a later run would reuse.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = part_path(path);
    let result = match tokio::fs::write(&tmp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    // A failed write may still have created a truncated `.part` file.
    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
