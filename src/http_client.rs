use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::USER_AGENT;
use tracing::{debug, warn};

use crate::config::HttpSettings;

const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide client. The first caller's timeout wins.
pub fn http_client(settings: &HttpSettings) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build http client")
    })
}

/// Source of raw page markup.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    settings: HttpSettings,
}

impl HttpFetcher {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let client = http_client(&self.settings)?;
        fetch_page(client, url, &self.settings)
    }
}

pub fn fetch_page(client: &Client, url: &str, settings: &HttpSettings) -> Result<String> {
    let resp = send_with_retry(settings, url, || {
        client.get(url).header(USER_AGENT, BROWSER_AGENT)
    })?;
    resp.text().context("failed reading body")
}

/// Sends the request built by `make`, retrying transport errors, 429 and
/// 5xx with linear backoff. Other non-success statuses fail at once.
pub fn send_with_retry(
    settings: &HttpSettings,
    what: &str,
    mut make: impl FnMut() -> RequestBuilder,
) -> Result<Response> {
    let attempts = settings.retries.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let wait = settings.backoff_ms.saturating_mul(u64::from(attempt - 1));
            thread::sleep(Duration::from_millis(wait));
        }
        debug!(what, attempt, "sending request");

        let resp = match make().send() {
            Ok(resp) => resp,
            Err(err) => {
                warn!(what, attempt, "request failed: {err}");
                last_err = Some(anyhow!(err).context("request failed"));
                continue;
            }
        };

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        if is_retryable(status) {
            warn!(what, attempt, %status, "retryable http status");
            last_err = Some(anyhow!("http {status}: {}", snippet(&body)));
            continue;
        }
        return Err(anyhow!("http {status} for {what}: {}", snippet(&body)));
    }

    Err(last_err
        .unwrap_or_else(|| anyhow!("no attempts made"))
        .context(format!("giving up on {what} after {attempts} attempts")))
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    body[..end].trim()
}
