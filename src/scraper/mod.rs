pub mod cache;
pub mod fetch;
pub mod inline_script;
pub mod metadata;
pub mod page;
pub mod raw_scan;
pub mod types;

use worker::Env;

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, FetchError};

use self::cache::{get_cached, save_diagnostic, set_cached};
use self::fetch::{PageFetcher, WorkerFetcher};
use self::page::extract_page;
use self::types::{AttemptOutcome, AttemptRecord, ExtractionResult, PostReference};

/// Best-effort video URL and caption extraction for one post.
///
/// Tries each configured path variant in order, with a pause between
/// variants. A fetch or parse failure on one variant only moves on to the
/// next; the caller sees a single error once every variant is exhausted.
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Extractor { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn extract<F: PageFetcher>(
        &self,
        fetcher: &F,
        reference: &PostReference,
    ) -> Result<ExtractionResult, ExtractError> {
        let variants = &self.config.path_variants;
        if variants.is_empty() {
            return Err(ExtractError::NoMatchingPathVariant(reference.to_string()));
        }

        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(variants.len());
        let mut last_body: Option<String> = None;
        let mut last_fetch_error: Option<(String, FetchError)> = None;

        for (index, variant) in variants.iter().copied().enumerate() {
            if index > 0 {
                fetcher.pause(self.config.variant_delay).await;
            }

            let url = variant.page_url(&self.config.base_url, reference);
            tracing::info!(reference = %reference, attempt = index + 1, %url, "scraping");

            let page = match fetcher.fetch_page(&url, self.config.request_timeout).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(reference = %reference, attempt = index + 1, error = %e, "fetch failed");
                    let outcome = match &e {
                        FetchError::Timeout(_) => AttemptOutcome::Timeout,
                        other => AttemptOutcome::FetchFailed {
                            reason: other.to_string(),
                        },
                    };
                    attempts.push(AttemptRecord {
                        index,
                        variant,
                        url: url.clone(),
                        outcome,
                    });
                    last_fetch_error = Some((url, e));
                    continue;
                }
            };

            tracing::debug!(status = page.status, len = page.body.len(), "page fetched");
            let extraction = extract_page(&page.body, &self.config);

            if let Some((video_url, source)) = extraction.video {
                tracing::info!(reference = %reference, ?source, caption_found = extraction.caption.is_some(), "extraction succeeded");
                attempts.push(AttemptRecord {
                    index,
                    variant,
                    url,
                    outcome: AttemptOutcome::Success { source },
                });
                return Ok(ExtractionResult {
                    video_url,
                    caption: extraction
                        .caption
                        .unwrap_or_else(|| self.config.default_caption.clone()),
                });
            }

            tracing::warn!(
                reference = %reference,
                attempt = index + 1,
                rejected = extraction.rejected.len(),
                has_mp4 = page.body.contains("mp4"),
                "no video url on page"
            );
            attempts.push(AttemptRecord {
                index,
                variant,
                url,
                outcome: AttemptOutcome::ParseFailed,
            });
            last_body = Some(page.body);
        }

        tracing::error!(reference = %reference, attempts = attempts.len(), "all path variants failed");

        if attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::ParseFailed)
        {
            return Err(ExtractError::ParseFailed {
                reference: reference.to_string(),
                attempts,
                last_body,
            });
        }

        match last_fetch_error {
            Some((url, reason)) => Err(ExtractError::FetchFailed {
                url,
                reason,
                attempts,
            }),
            None => Err(ExtractError::NoMatchingPathVariant(reference.to_string())),
        }
    }
}

/// Orchestrator: cache -> extraction -> cache write (or diagnostic snapshot).
///
/// KV problems are logged and never fail the request.
pub async fn fetch_extraction(
    extractor: &Extractor,
    reference: &PostReference,
    env: &Env,
) -> Result<ExtractionResult, ExtractError> {
    match get_cached(reference, env).await {
        Ok(Some(cached)) => {
            tracing::info!(reference = %reference, "cache hit");
            return Ok(cached);
        }
        Ok(None) => tracing::debug!(reference = %reference, "cache miss"),
        Err(e) => tracing::warn!(reference = %reference, error = %e, "cache unavailable"),
    }

    let fetcher = WorkerFetcher::new(extractor.config().user_agent.clone());
    match extractor.extract(&fetcher, reference).await {
        Ok(result) => {
            if let Err(e) = set_cached(reference, &result, env).await {
                tracing::warn!(reference = %reference, error = %e, "cache write failed");
            }
            Ok(result)
        }
        Err(err) => {
            if let ExtractError::ParseFailed {
                last_body: Some(body),
                ..
            } = &err
            {
                if extractor.config().save_diagnostics {
                    if let Err(e) = save_diagnostic(reference, body, env).await {
                        tracing::warn!(reference = %reference, error = %e, "diagnostic write failed");
                    }
                }
            }
            Err(err)
        }
    }
}
