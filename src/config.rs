//! Configuration types for a page download run.
//!
//! Every knob lives in [`DownloadConfig`], built via its
//! [`DownloadConfigBuilder`]. The defaults reproduce the book this tool was
//! first written for; pointing it at another archive only needs a different
//! base URL, page count and file-name [`PagePattern`].

use crate::error::Pages2PdfError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Archive the default configuration downloads from.
pub const DEFAULT_BASE_URL: &str =
    "https://webirbis.aonb.ru/irbisdoc/kr/2016/16ps117/files/assets/common/page-substrates/";

/// File-name template used by the default archive.
pub const DEFAULT_PATTERN: &str = "page{index:04}_5.jpg";

/// Configuration for a page download run.
///
/// Built via [`DownloadConfig::builder()`] or using
/// [`DownloadConfig::default()`].
///
/// # Example
/// ```rust
/// use pages2pdf::DownloadConfig;
///
/// let config = DownloadConfig::builder()
///     .base_url("https://example.org/pages/")
///     .page_count(3)
///     .output_dir("scans")
///     .build()
///     .unwrap();
/// assert_eq!(config.page_count, 3);
/// ```
#[derive(Clone)]
pub struct DownloadConfig {
    /// URL prefix every page file name is appended to.
    pub base_url: String,

    /// Number of pages; indices run `1..=page_count`. Default: 27.
    pub page_count: u32,

    /// File-name template for page `i`. Default: `page{index:04}_5.jpg`.
    pub pattern: PagePattern,

    /// Directory page images and the PDF are written to. Default: `new_book`.
    ///
    /// Files already present here are reused without being downloaded again.
    pub output_dir: PathBuf,

    /// File name of the assembled document inside `output_dir`. Default: `output.pdf`.
    pub output_file_name: String,

    /// HTTP attempts per page before it is declared failed. Default: 3.
    pub max_attempts: u32,

    /// Per-request timeout in seconds. Default: 10.
    pub request_timeout_secs: u64,

    /// `User-Agent` header sent with every request. Default: `Mozilla/5.0`.
    ///
    /// Some archives reject clients that do not look like a browser.
    pub user_agent: String,

    /// Lower bound of the random pause between two page downloads, in ms. Default: 500.
    pub pause_min_ms: u64,

    /// Upper bound of the random pause between two page downloads, in ms. Default: 1000.
    pub pause_max_ms: u64,

    /// JPEG quality used when embedding pages in the PDF (1–100). Default: 75.
    pub jpeg_quality: u8,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_count: 27,
            pattern: PagePattern::default(),
            output_dir: PathBuf::from("new_book"),
            output_file_name: "output.pdf".to_string(),
            max_attempts: 3,
            request_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            pause_min_ms: 500,
            pause_max_ms: 1000,
            jpeg_quality: 75,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("base_url", &self.base_url)
            .field("page_count", &self.page_count)
            .field("pattern", &self.pattern)
            .field("output_dir", &self.output_dir)
            .field("output_file_name", &self.output_file_name)
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("pause_min_ms", &self.pause_min_ms)
            .field("pause_max_ms", &self.pause_max_ms)
            .field("jpeg_quality", &self.jpeg_quality)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn DownloadProgressCallback>"),
            )
            .finish()
    }
}

impl DownloadConfig {
    /// Create a new builder for `DownloadConfig`.
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the assembled PDF.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }
}

/// Builder for [`DownloadConfig`].
#[derive(Debug)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn page_count(mut self, n: u32) -> Self {
        self.config.page_count = n;
        self
    }

    pub fn pattern(mut self, pattern: PagePattern) -> Self {
        self.config.pattern = pattern;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Random pause range between page downloads. `(0, 0)` disables it.
    pub fn pause_ms(mut self, min: u64, max: u64) -> Self {
        self.config.pause_min_ms = min;
        self.config.pause_max_ms = max;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DownloadConfig, Pages2PdfError> {
        let c = &self.config;
        match reqwest::Url::parse(&c.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(Pages2PdfError::InvalidConfig(format!(
                    "base URL must be http or https, got scheme '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(Pages2PdfError::InvalidConfig(format!(
                    "base URL '{}' is not a valid URL: {}",
                    c.base_url, e
                )))
            }
        }
        if c.page_count == 0 {
            return Err(Pages2PdfError::InvalidConfig(
                "Page count must be ≥ 1".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(Pages2PdfError::InvalidConfig(
                "Max attempts must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(Pages2PdfError::InvalidConfig(
                "Request timeout must be ≥ 1s".into(),
            ));
        }
        if c.pause_min_ms > c.pause_max_ms {
            return Err(Pages2PdfError::InvalidConfig(format!(
                "Pause range is inverted: {}ms > {}ms",
                c.pause_min_ms, c.pause_max_ms
            )));
        }
        if c.output_file_name.trim().is_empty() {
            return Err(Pages2PdfError::InvalidConfig(
                "Output file name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── File-name template ───────────────────────────────────────────────────

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{index(?::0(\d{1,2}))?\}").unwrap());

/// File-name template for a page, e.g. `page{index:04}_5.jpg`.
///
/// Exactly one placeholder is allowed: `{index}` renders the bare page
/// number, `{index:0W}` zero-pads it to `W` digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PagePattern {
    prefix: String,
    width: usize,
    suffix: String,
}

impl PagePattern {
    /// Render the file name for page `index` (1-based).
    pub fn render(&self, index: u32) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.suffix,
            width = self.width
        )
    }
}

impl Default for PagePattern {
    fn default() -> Self {
        Self {
            prefix: "page".to_string(),
            width: 4,
            suffix: "_5.jpg".to_string(),
        }
    }
}

impl FromStr for PagePattern {
    type Err = Pages2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut matches = PLACEHOLDER.captures_iter(s);
        let caps = matches.next().ok_or_else(|| {
            Pages2PdfError::InvalidConfig(format!(
                "pattern '{s}' has no {{index}} or {{index:0N}} placeholder"
            ))
        })?;
        if matches.next().is_some() {
            return Err(Pages2PdfError::InvalidConfig(format!(
                "pattern '{s}' has more than one index placeholder"
            )));
        }

        let whole = caps
            .get(0)
            .ok_or_else(|| Pages2PdfError::Internal("empty placeholder match".into()))?;
        let width = match caps.get(1) {
            Some(w) => w.as_str().parse().map_err(|_| {
                Pages2PdfError::InvalidConfig(format!("bad pad width in pattern '{s}'"))
            })?,
            None => 0,
        };

        let prefix = &s[..whole.start()];
        let suffix = &s[whole.end()..];
        if prefix.contains(['/', '\\']) || suffix.contains(['/', '\\']) {
            return Err(Pages2PdfError::InvalidConfig(format!(
                "pattern '{s}' must be a bare file name"
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            width,
            suffix: suffix.to_string(),
        })
    }
}

impl TryFrom<String> for PagePattern {
    type Error = Pages2PdfError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PagePattern> for String {
    fn from(p: PagePattern) -> Self {
        p.to_string()
    }
}

impl fmt::Display for PagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 0 {
            write!(f, "{}{{index}}{}", self.prefix, self.suffix)
        } else {
            write!(f, "{}{{index:0{}}}{}", self.prefix, self.width, self.suffix)
        }
    }
}
