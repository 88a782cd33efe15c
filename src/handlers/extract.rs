use worker::*;

use super::{config_error_response, extract_error_response};
use crate::config::ExtractorConfig;
use crate::scraper::types::PostReference;
use crate::scraper::{fetch_extraction, Extractor};

/// Picks the post out of the route param, or the `url` query parameter.
fn requested_post(req: &Request, ctx: &RouteContext<()>) -> Result<Option<String>> {
    if let Some(post_id) = ctx.param("postID") {
        return Ok(Some(post_id.clone()));
    }
    let url = req.url()?;
    Ok(url
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.into_owned()))
}

/// Route: `/extract/:postID`, `/extract?url=...` and the Instagram-shaped paths.
pub async fn handle(req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let raw = requested_post(&req, &ctx)?.unwrap_or_default();

    let reference = match PostReference::parse(&raw) {
        Ok(reference) => reference,
        Err(e) => return extract_error_response(&e),
    };

    let config = match ExtractorConfig::from_env(&ctx.env) {
        Ok(config) => config,
        Err(e) => return config_error_response(&e),
    };

    tracing::info!(reference = %reference, path = %req.path(), "extract request");
    match fetch_extraction(&Extractor::new(config), &reference, &ctx.env).await {
        Ok(result) => Response::from_json(&result),
        Err(e) => extract_error_response(&e),
    }
}
