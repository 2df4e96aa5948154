//! CLI binary for pages2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `DownloadConfig` and prints the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pages2pdf::{
    acquire, AssemblyOutcome, DownloadConfig, DownloadProgressCallback, PagePattern,
    ProgressCallback, RunReport,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar plus a log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    failed: AtomicU32,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Downloading");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed: AtomicU32::new(0),
        })
    }
}

impl DownloadProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: u32) {
        self.bar.set_length(u64::from(total_pages));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Fetching {total_pages} pages…"))
        ));
    }

    fn on_page_cached(&self, index: u32, total: u32) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            dim("•"),
            index,
            total,
            dim("already on disk")
        ));
        self.bar.inc(1);
    }

    fn on_page_start(&self, index: u32, _total: u32) {
        self.bar.set_message(format!("page {index}"));
    }

    fn on_page_saved(&self, index: u32, total: u32, bytes: u64) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>8} bytes", bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_page_failed(&self, index: u32, total: u32, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: u32, obtained: u32) {
        self.bar.finish_and_clear();
        let failed = self.failed.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} pages available",
                green("✔"),
                bold(&obtained.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages available  ({} failed)",
                if obtained == 0 { red("✘") } else { cyan("⚠") },
                bold(&obtained.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download the default book into ./new_book and build new_book/output.pdf
  pages2pdf

  # Another book on the same archive
  pages2pdf --base-url https://webirbis.aonb.ru/irbisdoc/kr/2016/16ps117/files/assets/common/page-substrates/ \
            --pages 27 -o my_book

  # A different naming scheme: scan-1.png, scan-2.png, …
  pages2pdf --base-url https://example.org/scans/ --pattern 'scan-{index}.png' --pages 40

  # Resume after a failure: pages already in the directory are reused
  pages2pdf -o my_book

  # Machine-readable run report
  pages2pdf --json > report.json

PATTERN SYNTAX:
  {index}      page number as-is            (7)
  {index:04}   page number zero-padded to 4  (0007)

ENVIRONMENT VARIABLES:
  Every flag has a PAGES2PDF_* equivalent, e.g. PAGES2PDF_BASE_URL.
  RUST_LOG overrides the log filter (e.g. RUST_LOG=pages2pdf=debug).
"#;

/// Download numbered page scans and bind them into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pages2pdf",
    version,
    about = "Download numbered page scans from a web archive and bind them into one PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// URL prefix the page file names are appended to.
    #[arg(long, env = "PAGES2PDF_BASE_URL", default_value = pages2pdf::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Number of pages (indices 1..=N).
    #[arg(long, env = "PAGES2PDF_PAGES", default_value_t = 27,
          value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,

    /// Page file-name template.
    #[arg(long, env = "PAGES2PDF_PATTERN", default_value = pages2pdf::config::DEFAULT_PATTERN)]
    pattern: String,

    /// Directory for page images and the PDF.
    #[arg(short, long, env = "PAGES2PDF_OUTPUT_DIR", default_value = "new_book")]
    output_dir: PathBuf,

    /// File name of the PDF inside the output directory.
    #[arg(long, env = "PAGES2PDF_OUTPUT_NAME", default_value = "output.pdf")]
    output_name: String,

    /// HTTP attempts per page.
    #[arg(long, env = "PAGES2PDF_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PAGES2PDF_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// User-Agent header sent with every request.
    #[arg(long, env = "PAGES2PDF_USER_AGENT", default_value = "Mozilla/5.0")]
    user_agent: String,

    /// Minimum pause between page downloads, in milliseconds.
    #[arg(long, env = "PAGES2PDF_PAUSE_MIN_MS", default_value_t = 500)]
    pause_min_ms: u64,

    /// Maximum pause between page downloads, in milliseconds.
    #[arg(long, env = "PAGES2PDF_PAUSE_MAX_MS", default_value_t = 1000)]
    pause_max_ms: u64,

    /// JPEG quality of pages embedded in the PDF (1–100).
    #[arg(long, env = "PAGES2PDF_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PAGES2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PAGES2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGES2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGES2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO lines; -v always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let report = acquire(&config).await.context("Download run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `DownloadConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DownloadConfig> {
    let pattern: PagePattern = cli
        .pattern
        .parse()
        .with_context(|| format!("Invalid --pattern '{}'", cli.pattern))?;

    let mut builder = DownloadConfig::builder()
        .base_url(cli.base_url.clone())
        .page_count(cli.pages)
        .pattern(pattern)
        .output_dir(cli.output_dir.clone())
        .output_file_name(cli.output_name.clone())
        .max_attempts(cli.max_attempts)
        .request_timeout_secs(cli.timeout)
        .user_agent(cli.user_agent.clone())
        .pause_ms(cli.pause_min_ms, cli.pause_max_ms)
        .jpeg_quality(cli.jpeg_quality);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &RunReport) {
    let s = &report.stats;
    match &report.assembly {
        Some(AssemblyOutcome::Written { path, pages }) => eprintln!(
            "{}  {} pages  →  {}",
            green("✔"),
            pages,
            bold(&path.display().to_string())
        ),
        Some(AssemblyOutcome::DecodeFailed { path, detail }) => eprintln!(
            "{}  PDF not created: cannot read {} ({})",
            red("✘"),
            path.display(),
            detail
        ),
        Some(AssemblyOutcome::NoPages) => {
            eprintln!("{}  PDF not created: no pages", red("✘"))
        }
        None => eprintln!(
            "{}  PDF not created: {} of {} pages missing; run again to retry them",
            cyan("⚠"),
            s.failed_pages,
            s.total_pages
        ),
    }
    eprintln!(
        "   {} cached  /  {} downloaded ({} bytes),  {}ms total",
        dim(&s.cached_pages.to_string()),
        dim(&s.downloaded_pages.to_string()),
        dim(&s.bytes_downloaded.to_string()),
        s.total_duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_build_default_config() {
        let cli = Cli::parse_from(["pages2pdf"]);
        let config = build_config(&cli, None).unwrap();
        let default = DownloadConfig::default();
        assert_eq!(config.base_url, default.base_url);
        assert_eq!(config.page_count, default.page_count);
        assert_eq!(config.pattern, default.pattern);
        assert_eq!(config.output_path(), default.output_path());
    }

    #[test]
    fn cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "pages2pdf",
            "--base-url",
            "https://example.org/pages/",
            "--pages",
            "3",
            "--pattern",
            "scan-{index}.png",
            "-o",
            "book",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.page_count, 3);
        assert_eq!(config.pattern.render(2), "scan-2.png");
        assert_eq!(config.output_dir, PathBuf::from("book"));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let cli = Cli::parse_from(["pages2pdf", "--pattern", "page.jpg"]);
        assert!(build_config(&cli, None).is_err());
    }
}
