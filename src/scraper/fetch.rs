use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{select, Either};
use worker::*;

use crate::error::FetchError;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
                           image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// A fetched page. Status is always in the accepted 200..400 window.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Sequential sleep between requests.
#[allow(async_fn_in_trait)]
pub trait Pause {
    async fn pause(&self, duration: Duration);
}

/// Fetches one source page. Implementations must follow redirects and give
/// up after `timeout`.
#[allow(async_fn_in_trait)]
pub trait PageFetcher: Pause {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> std::result::Result<FetchedPage, FetchError>;
}

/// `Fetch`-backed page source that looks like a desktop Chrome navigation.
pub struct WorkerFetcher {
    user_agent: String,
}

impl WorkerFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        WorkerFetcher {
            user_agent: user_agent.into(),
        }
    }

    fn browser_headers(&self) -> Result<Headers> {
        let headers = Headers::new();
        headers.set("User-Agent", &self.user_agent)?;
        headers.set("Accept", ACCEPT_HTML)?;
        headers.set("Accept-Language", "en-US,en;q=0.9")?;
        headers.set("Upgrade-Insecure-Requests", "1")?;
        headers.set("Sec-Fetch-Dest", "document")?;
        headers.set("Sec-Fetch-Mode", "navigate")?;
        headers.set("Sec-Fetch-Site", "none")?;
        headers.set("Cache-Control", "max-age=0")?;
        Ok(headers)
    }
}

impl Pause for WorkerFetcher {
    async fn pause(&self, duration: Duration) {
        WorkerPause.pause(duration).await
    }
}

impl PageFetcher for WorkerFetcher {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> std::result::Result<FetchedPage, FetchError> {
        let mut init = RequestInit::new();
        init.with_method(Method::Get)
            .with_headers(self.browser_headers()?)
            .with_redirect(RequestRedirect::Follow);
        let request = Request::new_with_init(url, &init)?;

        let controller = AbortController::default();
        let signal = controller.signal();
        let fetch = Fetch::Request(request);

        // The deadline covers the body as well as the headers.
        let download = async {
            let mut resp = fetch.send_with_signal(&signal).await?;
            let status = resp.status_code();
            if !(200..400).contains(&status) {
                return Err(FetchError::Status(status));
            }
            let body = resp.text().await?;
            Ok(FetchedPage { status, body })
        };

        let result = within_deadline(download, Delay::from(timeout), timeout).await;
        match &result {
            Ok(page) => tracing::debug!(url, status = page.status, len = page.body.len(), "fetched page"),
            Err(FetchError::Timeout(_)) => controller.abort(),
            Err(_) => {}
        }
        result
    }
}

/// Races `work` against `deadline`; losing the race is a `Timeout`.
async fn within_deadline<T, W, D>(work: W, deadline: D, timeout: Duration) -> std::result::Result<T, FetchError>
where
    W: Future<Output = std::result::Result<T, FetchError>>,
    D: Future<Output = ()>,
{
    match select(pin!(work), pin!(deadline)).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(FetchError::Timeout(timeout)),
    }
}

/// `Delay`-backed pause for code that sleeps without fetching pages.
pub struct WorkerPause;

impl Pause for WorkerPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            Delay::from(duration).await;
        }
    }
}
