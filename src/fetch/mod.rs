// src/fetch/mod.rs
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::StatusCode;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ScrapeError;

pub mod urls;

/// Browser-like identity. Statsguru serves challenge pages to anything that
/// announces itself as a script.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Minimum spacing between consecutive requests.
    pub min_delay: Duration,
    pub request_timeout: Duration,
    /// Retries on top of the first attempt, for transient failures only.
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(700),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Transport seam: anything that can turn a URL into page text. Alternate
/// client strategies (headless browser, challenge solver) implement this
/// without touching the rest of the pipeline.
pub trait Fetcher {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError>;
}

enum Attempt {
    Transient(String),
    Fatal(ScrapeError),
}

/// Plain HTTP fetcher with paced requests and bounded retry.
pub struct HttpFetcher {
    client: Client,
    settings: FetchSettings,
    last_request: Option<Instant>,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            last_request: None,
        })
    }

    /// Blocks until at least `min_delay` has passed since the previous request.
    fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.settings.min_delay {
                thread::sleep(self.settings.min_delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }

    fn try_fetch(&self, url: &Url) -> Result<String, Attempt> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Attempt::Transient(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Fatal(ScrapeError::Blocked {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Attempt::Fatal(ScrapeError::SubjectNotFound {
                url: url.to_string(),
            }));
        }
        if status.is_server_error() {
            return Err(Attempt::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Attempt::Fatal(ScrapeError::Fetch {
                url: url.to_string(),
                attempts: 1,
                reason: format!("HTTP {status}"),
            }));
        }

        let body = response
            .text()
            .map_err(|e| Attempt::Transient(e.to_string()))?;
        if is_challenge_page(&body) {
            return Err(Attempt::Fatal(ScrapeError::Blocked {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }
        Ok(body)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            attempts: 0,
            reason: format!("invalid URL: {e}"),
        })?;

        let mut attempt: u32 = 0;
        loop {
            self.pace();
            match self.try_fetch(&parsed) {
                Ok(body) => {
                    debug!(%url, bytes = body.len(), "fetched");
                    return Ok(body);
                }
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Transient(reason)) if attempt < self.settings.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.settings.initial_backoff, attempt);
                    warn!(%url, attempt, delay_ms = delay.as_millis() as u64, %reason, "transient failure, retrying");
                    thread::sleep(delay);
                }
                Err(Attempt::Transient(reason)) => {
                    error!(%url, %reason, "exhausted retries");
                    return Err(ScrapeError::Fetch {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        reason,
                    });
                }
            }
        }
    }
}

/// Doubling backoff: 1s, 2s, 4s, ... for retries 1, 2, 3, ...
fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Challenge interstitials come back with HTTP 200; the page text gives
/// them away.
fn is_challenge_page(body: &str) -> bool {
    let head: String = body.chars().take(4096).collect::<String>().to_lowercase();
    head.contains("cf-browser-verification")
        || head.contains("just a moment...")
        || head.contains("attention required!")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let initial = Duration::from_secs(1);
        assert_eq!(backoff_delay(initial, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(initial, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(initial, 3), Duration::from_secs(4));
    }

    #[test]
    fn default_settings_are_polite() {
        let settings = FetchSettings::default();
        assert_eq!(settings.min_delay, Duration::from_millis(700));
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn challenge_markers_detected() {
        assert!(is_challenge_page(
            "<html><head><title>Just a moment...</title></head></html>"
        ));
        assert!(is_challenge_page(
            "<div id=\"cf-browser-verification\"></div>"
        ));
        assert!(!is_challenge_page(
            "<html><body><table><tr><td>1</td></tr></table></body></html>"
        ));
    }
}
