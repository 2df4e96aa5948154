//! Page enumeration: expand `1..=N` into download tasks.

use crate::config::DownloadConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One remote page image and where it is stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTask {
    /// 1-based page index.
    pub index: u32,
    pub remote_url: String,
    pub local_path: PathBuf,
}

/// Build the task for page `index`.
///
/// The URL is the base URL with the rendered file name appended verbatim;
/// archives of this kind expose a flat directory of page files.
pub fn page_task(config: &DownloadConfig, index: u32) -> PageTask {
    let file_name = config.pattern.render(index);
    PageTask {
        index,
        remote_url: format!("{}{}", config.base_url, file_name),
        local_path: config.output_dir.join(file_name),
    }
}

/// All tasks for the configured range, in page order.
pub fn page_tasks(config: &DownloadConfig) -> impl Iterator<Item = PageTask> + '_ {
    (1..=config.page_count).map(move |i| page_task(config, i))
}
