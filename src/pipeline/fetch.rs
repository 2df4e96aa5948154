//! Page download: one HTTP GET per attempt, bounded attempt budget.
//!
//! ## Retry Strategy
//!
//! Archives serving page scans fail in two ways: a status code (the page
//! is missing, or the backend hiccupped) or a transport error (DNS,
//! connect, timeout). Both are retried immediately up to `max_attempts`;
//! the caller's pause between *pages* is the only throttling. A 404 is
//! retried like any other status since some archives answer 404 while a
//! scan is still being published.

use crate::config::DownloadConfig;
use crate::error::{FetchError, Pages2PdfError};
use crate::pipeline::write_atomic;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of [`Fetcher::fetch`] when no filesystem error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to the destination on attempt `attempts`.
    Saved { attempts: u32, bytes: u64 },
    /// Every attempt failed; the destination was not created.
    Exhausted { attempts: u32, last_error: FetchError },
}

impl FetchOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FetchOutcome::Saved { .. })
    }
}

/// HTTP client plus the attempt budget for one run.
///
/// TLS certificates are validated against the bundled web PKI roots
/// (rustls), so the tool behaves the same on hosts without a system CA store.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_attempts: u32,
    timeout_secs: u64,
}

impl Fetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self, Pages2PdfError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Pages2PdfError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Download `url` into `destination`.
    ///
    /// Returns `Ok(Exhausted)` when the attempt budget runs out; `Err` is
    /// reserved for failing to write the file, which retrying cannot fix.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<FetchOutcome, Pages2PdfError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 1..=self.max_attempts {
            match self.get_once(url).await {
                Ok(body) => {
                    write_atomic(destination, &body).await.map_err(|e| {
                        Pages2PdfError::PageWriteFailed {
                            path: destination.to_path_buf(),
                            source: e,
                        }
                    })?;
                    info!("Saved page image: {}", destination.display());
                    return Ok(FetchOutcome::Saved {
                        attempts: attempt,
                        bytes: body.len() as u64,
                    });
                }
                Err(e) => {
                    match &e {
                        FetchError::HttpStatus { status: 404 } => warn!(
                            "Attempt {}/{}: page not found at {}",
                            attempt, self.max_attempts, url
                        ),
                        FetchError::HttpStatus { status } => warn!(
                            "Attempt {}/{}: HTTP {} for {}",
                            attempt, self.max_attempts, status, url
                        ),
                        other => error!(
                            "Attempt {}/{}: request to {} failed: {}",
                            attempt, self.max_attempts, url, other
                        ),
                    }
                    last_error = Some(e);
                }
            }
        }

        error!(
            "Page image not retrieved after {} attempts: {}",
            self.max_attempts, url
        );
        Ok(FetchOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_else(|| FetchError::Transport {
                detail: "no attempt was made".into(),
            }),
        })
    }

    /// One GET; the whole body is buffered before returning.
    async fn get_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("GET {} → {} bytes", url, body.len());
        Ok(body.to_vec())
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            FetchError::Transport {
                detail: error_chain(&e),
            }
        }
    }
}

/// `reqwest` keeps the useful part (DNS failure, refused connection) in
/// the source chain; flatten it into one line.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(base_url: String, max_attempts: u32) -> DownloadConfig {
        DownloadConfig::builder()
            .base_url(base_url)
            .max_attempts(max_attempts)
            .build()
            .unwrap()
    }

    #[test]
    fn attempt_budget_comes_from_config() {
        let fetcher = Fetcher::new(&config_for("http://127.0.0.1:9/".into(), 5)).unwrap();
        assert_eq!(fetcher.max_attempts(), 5);
    }

    #[tokio::test]
    async fn saves_body_on_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page0001_5.jpg"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"scan-1".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page0001_5.jpg");
        let fetcher = Fetcher::new(&config_for(format!("{}/pages/", server.uri()), 3)).unwrap();

        let outcome = fetcher
            .fetch(&format!("{}/pages/page0001_5.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Saved {
                attempts: 1,
                bytes: 6
            }
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"scan-1");
    }

    #[tokio::test]
    async fn retries_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pages/page0003_5.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages/page0003_5.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"scan-3".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page0003_5.jpg");
        let fetcher = Fetcher::new(&config_for(server.uri(), 3)).unwrap();

        let outcome = fetcher
            .fetch(&format!("{}/pages/page0003_5.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Saved {
                attempts: 2,
                bytes: 6
            }
        );
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn not_found_exhausts_budget_without_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page0009_5.jpg");
        let fetcher = Fetcher::new(&config_for(server.uri(), 3)).unwrap();

        let outcome = fetcher
            .fetch(&format!("{}/pages/page0009_5.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Exhausted {
                attempts: 3,
                last_error: FetchError::HttpStatus { status: 404 }
            }
        );
        assert!(!outcome.is_saved());
        assert!(!dest.exists());
        assert_eq!(fetcher.max_attempts(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = format!("http://127.0.0.1:{port}/");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page.jpg");
        let fetcher = Fetcher::new(&config_for(base.clone(), 2)).unwrap();

        let outcome = fetcher
            .fetch(&format!("{base}page.jpg"), &dest)
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Exhausted {
                attempts: 2,
                last_error: FetchError::Transport { .. },
            } => {}
            other => panic!("expected transport exhaustion, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_millis(2500)),
            )
            .mount(&server)
            .await;

        let config = DownloadConfig::builder()
            .base_url(server.uri())
            .max_attempts(1)
            .request_timeout_secs(1)
            .build()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page.jpg");
        let fetcher = Fetcher::new(&config).unwrap();

        let outcome = fetcher
            .fetch(&format!("{}/page.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            FetchOutcome::Exhausted {
                attempts: 1,
                last_error: FetchError::Timeout { secs: 1 }
            }
        );
    }

    #[tokio::test]
    async fn unwritable_destination_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"scan".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("page.jpg");
        let fetcher = Fetcher::new(&config_for(server.uri(), 3)).unwrap();

        let result = fetcher
            .fetch(&format!("{}/page.jpg", server.uri()), &dest)
            .await;

        assert!(matches!(
            result,
            Err(Pages2PdfError::PageWriteFailed { .. })
        ));
    }

    #[test]
    fn error_chain_joins_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let outer = Pages2PdfError::PageWriteFailed {
            path: "x".into(),
            source: inner,
        };
        let chain = error_chain(&outer);
        assert!(chain.ends_with(": refused"), "got: {chain}");
    }
}
