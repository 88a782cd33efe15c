use worker::*;

use super::config_error_response;
use crate::config::{BatchConfig, ExtractorConfig, GraphConfig};
use crate::pipeline::tracker::KvTracker;
use crate::pipeline::{BatchRunner, Publisher};
use crate::publish::graph_api::GraphApiClient;
use crate::publish::PublishSchedule;
use crate::scraper::cache::KV_BINDING;
use crate::scraper::fetch::WorkerFetcher;
use crate::scraper::Extractor;

/// Route: `POST /batch`, body is one post URL per line.
pub async fn handle(mut req: Request, ctx: RouteContext<()>) -> Result<Response> {
    let body = req.text().await?;

    let extractor_config = match ExtractorConfig::from_env(&ctx.env) {
        Ok(config) => config,
        Err(e) => return config_error_response(&e),
    };
    let batch_config = match BatchConfig::from_env(&ctx.env) {
        Ok(config) => config,
        Err(e) => return config_error_response(&e),
    };
    let graph_config = match GraphConfig::from_env(&ctx.env) {
        Ok(config) => config,
        Err(e) => return config_error_response(&e),
    };

    let fetcher = WorkerFetcher::new(extractor_config.user_agent.clone());
    let extractor = Extractor::new(extractor_config);

    let schedule = graph_config.as_ref().map(PublishSchedule::from);
    let client = graph_config.map(GraphApiClient::new);
    let publisher = client.as_ref().zip(schedule).map(|(api, schedule)| Publisher { api, schedule });
    if publisher.is_none() {
        tracing::info!("publishing not configured, running extraction only");
    }

    let tracker = match ctx.env.kv(KV_BINDING) {
        Ok(store) => Some(KvTracker::new(store)),
        Err(e) => {
            tracing::warn!(error = %e, "kv unavailable, duplicate tracking disabled");
            None
        }
    };

    let runner = BatchRunner {
        extractor: &extractor,
        fetcher: &fetcher,
        publisher,
        tracker: tracker.as_ref(),
        config: batch_config,
    };
    let report = runner.run(&body).await;
    Response::from_json(&report)
}
