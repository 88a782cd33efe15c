use url::Url;
use worker::*;

use crate::config::ExtractorConfig;
use crate::error::ConfigError;
use crate::scraper::types::{PathVariant, PostReference};
use crate::scraper::{fetch_extraction, Extractor};

/// The redirect route always answers with a redirect, so a bad var falls
/// back to the defaults after being logged.
fn config_or_default(config: std::result::Result<ExtractorConfig, ConfigError>) -> ExtractorConfig {
    config.unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration, using defaults");
        ExtractorConfig::default()
    })
}

fn redirect_to_url(target: &str) -> Result<Response> {
    let parsed = Url::parse(target).map_err(|e| Error::RustError(e.to_string()))?;
    Response::redirect(parsed)
}

/// Direct video redirect handler.
///
/// Route: `/videos/:postID`
/// Extracts the post and redirects to its video URL, or back to the post
/// page when nothing could be extracted.
pub async fn videos(_req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let Some(raw) = ctx.param("postID").cloned() else {
        return Response::error("Bad Request", 400);
    };
    let reference = match PostReference::parse(&raw) {
        Ok(reference) => reference,
        Err(_) => return Response::error("Bad Request", 400),
    };

    let config = config_or_default(ExtractorConfig::from_env(&ctx.env));
    let post_page = PathVariant::Post.page_url(&config.base_url, &reference);

    match fetch_extraction(&Extractor::new(config), &reference, &ctx.env).await {
        Ok(result) => redirect_to_url(&result.video_url),
        Err(e) => {
            tracing::warn!(reference = %reference, error = %e, "no video, redirecting to post");
            redirect_to_url(&post_page)
        }
    }
}
