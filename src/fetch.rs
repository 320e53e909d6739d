//! Page fetching with bounded retries and linear backoff.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: Core trait, "give me the text of this URL"
//! - [`HttpFetcher`]: A single GET through a shared `reqwest::Client`
//! - [`RetryFetch`]: Decorator that retries any [`PageFetcher`]
//!
//! # Retry Strategy
//!
//! - `max_retries` attempts in total
//! - After failed attempt `i` (0-based) wait `base + i * step`
//! - No wait after the last attempt
//! - Client errors other than 408/429 are permanent and not retried
//!
//! Callers only ever see "got text" or a [`FetchError`]; the variants exist
//! for log output, not for control flow.

use crate::config::FetchConfig;
use reqwest::StatusCode;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// A failed page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned an empty body")]
    EmptyBody { url: String },
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// True for failures another attempt cannot fix.
    pub fn is_permanent(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            FetchError::Client(_) => true,
            FetchError::Transport { .. } | FetchError::EmptyBody { .. } => false,
        }
    }
}

/// Anything that can turn a URL into page text.
pub trait PageFetcher {
    /// Fetch `url` and return its body. An empty body is an error.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured timeout and `User-Agent`.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Wrapper that adds linear-backoff retries to any [`PageFetcher`].
///
/// The wait after failed attempt `i` is:
/// ```text
/// delay = base + i * step
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    step: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Wrap `inner`. `max_retries` counts every attempt and is at least one.
    pub fn new(inner: T, max_retries: usize, base_delay: Duration, step: Duration) -> Self {
        Self {
            inner,
            max_retries: max_retries.max(1),
            base_delay,
            step,
        }
    }

    /// Wrap `inner` using the retry settings from `config`.
    pub fn from_config(inner: T, config: &FetchConfig) -> Self {
        Self::new(
            inner,
            config.max_retries,
            config.backoff_base(),
            config.backoff_step(),
        )
    }

    fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_add(self.step.saturating_mul(attempt as u32))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("step", &self.step)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    if e.is_permanent() || attempt >= self.max_retries {
                        warn!(
                            attempt,
                            max = self.max_retries,
                            permanent = e.is_permanent(),
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "fetch() giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_after(attempt - 1);
                    debug!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    /// Fails with a retryable status `failures` times, then succeeds.
    struct Flaky {
        failures: usize,
        status: u16,
        calls: AtomicUsize,
    }

    impl PageFetcher for Flaky {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: self.status,
                })
            } else {
                Ok("<html>ok</html>".to_string())
            }
        }
    }

    fn flaky(failures: usize, status: u16) -> Flaky {
        Flaky {
            failures,
            status,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_permanent_classification() {
        let status = |status| FetchError::Status {
            url: "u".into(),
            status,
        };
        assert!(status(404).is_permanent());
        assert!(status(403).is_permanent());
        assert!(!status(429).is_permanent());
        assert!(!status(408).is_permanent());
        assert!(!status(503).is_permanent());
        assert!(!FetchError::EmptyBody { url: "u".into() }.is_permanent());
    }

    #[test]
    fn test_linear_backoff_delays() {
        let retry = RetryFetch::new(
            flaky(0, 500),
            3,
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(retry.delay_after(0), Duration::from_secs(1));
        assert_eq!(retry.delay_after(1), Duration::from_secs(2));
        assert_eq!(retry.delay_after(2), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let retry = RetryFetch::new(flaky(2, 503), 3, Duration::ZERO, Duration::ZERO);
        let body = retry.fetch("https://example.com").await.unwrap();
        assert_eq!(body, "<html>ok</html>");
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let retry = RetryFetch::new(flaky(10, 503), 3, Duration::ZERO, Duration::ZERO);
        assert!(retry.fetch("https://example.com").await.is_err());
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let retry = RetryFetch::new(flaky(10, 404), 3, Duration::ZERO, Duration::ZERO);
        assert!(retry.fetch("https://example.com").await.is_err());
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_still_tries_once() {
        let retry = RetryFetch::new(flaky(0, 503), 0, Duration::ZERO, Duration::ZERO);
        assert!(retry.fetch("https://example.com").await.is_ok());
    }

    fn spawn_server(hits: Arc<AtomicUsize>) -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            let request = match server.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(req)) => req,
                Ok(None) => continue,
                Err(_) => break,
            };
            let path = request.url().to_string();
            let response = match path.as_str() {
                "/ok" => tiny_http::Response::from_string("<html><h1>Hola</h1></html>"),
                "/empty" => tiny_http::Response::from_string(""),
                "/missing" => {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tiny_http::Response::from_string("not found").with_status_code(404)
                }
                "/flaky" => {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        tiny_http::Response::from_string("busy").with_status_code(503)
                    } else {
                        tiny_http::Response::from_string("<p>recovered</p>")
                    }
                }
                _ => tiny_http::Response::from_string("nope").with_status_code(500),
            };
            let _ = request.respond(response);
        });

        (base_url, shutdown_tx, handle)
    }

    fn test_fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_fetcher_success_and_failures() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (base, shutdown, handle) = spawn_server(hits.clone());
        let fetcher = test_fetcher();

        let body = fetcher.fetch(&format!("{base}/ok")).await.unwrap();
        assert!(body.contains("Hola"));

        let empty = fetcher.fetch(&format!("{base}/empty")).await.unwrap_err();
        assert!(matches!(empty, FetchError::EmptyBody { .. }));

        let missing = fetcher.fetch(&format!("{base}/missing")).await.unwrap_err();
        assert!(matches!(missing, FetchError::Status { status: 404, .. }));

        shutdown.send(()).unwrap();
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_retrying_http_fetcher_against_server() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (base, shutdown, handle) = spawn_server(hits.clone());
        let fetcher = RetryFetch::new(test_fetcher(), 3, Duration::ZERO, Duration::ZERO);

        let body = fetcher.fetch(&format!("{base}/flaky")).await.unwrap();
        assert_eq!(body, "<p>recovered</p>");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        hits.store(0, Ordering::SeqCst);
        assert!(fetcher.fetch(&format!("{base}/missing")).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        shutdown.send(()).unwrap();
        handle.join().unwrap();
    }
}
