pub mod tracker;

use serde::Serialize;

use crate::config::BatchConfig;
use crate::publish::{publish_video, GraphApi, PublishSchedule};
use crate::scraper::fetch::PageFetcher;
use crate::scraper::types::{ExtractionResult, PostReference};
use crate::scraper::Extractor;
use crate::utils::instagram::post_url_lines;

use self::tracker::{DuplicateTracker, TrackedEntry};

/// What happened to one input line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItemOutcome {
    Extracted {
        #[serde(flatten)]
        result: ExtractionResult,
    },
    #[serde(rename_all = "camelCase")]
    Published {
        #[serde(flatten)]
        result: ExtractionResult,
        media_id: String,
    },
    Skipped,
    Failed {
        error: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub input: String,
    pub shortcode: Option<PostReference>,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    fn push(&mut self, item: BatchItem) {
        match item.outcome {
            ItemOutcome::Extracted { .. } | ItemOutcome::Published { .. } => self.succeeded += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.total += 1;
        self.items.push(item);
    }
}

/// Where extracted videos go. `None` runs the batch as extraction only.
pub struct Publisher<'a, G> {
    pub api: &'a G,
    pub schedule: PublishSchedule,
}

/// Processes a list of post URLs one at a time.
pub struct BatchRunner<'a, F, G, T> {
    pub extractor: &'a Extractor,
    pub fetcher: &'a F,
    pub publisher: Option<Publisher<'a, G>>,
    pub tracker: Option<&'a T>,
    pub config: BatchConfig,
}

impl<F, G, T> BatchRunner<'_, F, G, T>
where
    F: PageFetcher,
    G: GraphApi,
    T: DuplicateTracker,
{
    pub async fn run(&self, input: &str) -> BatchReport {
        let lines = post_url_lines(input);
        tracing::info!(count = lines.len(), "starting batch");

        let mut report = BatchReport::default();
        let mut worked = false;

        for line in lines {
            let reference = match PostReference::parse(&line) {
                Ok(reference) => reference,
                Err(e) => {
                    tracing::warn!(input = %line, error = %e, "skipping unparseable line");
                    report.push(BatchItem {
                        input: line,
                        shortcode: None,
                        outcome: ItemOutcome::Failed {
                            error: e.kind().to_string(),
                            message: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            if self.already_processed(&reference).await {
                tracing::info!(reference = %reference, "already processed, skipping");
                report.push(BatchItem {
                    input: line,
                    shortcode: Some(reference),
                    outcome: ItemOutcome::Skipped,
                });
                continue;
            }

            if worked {
                self.fetcher.pause(self.config.item_delay).await;
            }
            worked = true;

            let outcome = self.process(&line, &reference).await;
            report.push(BatchItem {
                input: line,
                shortcode: Some(reference),
                outcome,
            });
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "batch finished"
        );
        report
    }

    async fn already_processed(&self, reference: &PostReference) -> bool {
        let Some(tracker) = self.tracker else {
            return false;
        };
        match tracker.contains(reference).await {
            Ok(seen) => seen,
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "tracker lookup failed");
                false
            }
        }
    }

    async fn process(&self, line: &str, reference: &PostReference) -> ItemOutcome {
        let result = match self.extractor.extract(self.fetcher, reference).await {
            Ok(result) => result,
            Err(e) => {
                return ItemOutcome::Failed {
                    error: e.kind().to_string(),
                    message: e.to_string(),
                }
            }
        };

        let Some(publisher) = &self.publisher else {
            return ItemOutcome::Extracted { result };
        };

        let media_id = match publish_video(publisher.api, publisher.schedule, &result.video_url, &result.caption).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(reference = %reference, error = %e, "publish failed");
                return ItemOutcome::Failed {
                    error: "PublishFailed".to_string(),
                    message: e.to_string(),
                };
            }
        };

        if let Some(tracker) = self.tracker {
            let entry = TrackedEntry {
                shortcode: reference.clone(),
                source_url: line.to_string(),
                video_url: result.video_url.clone(),
                published_id: Some(media_id.clone()),
            };
            if let Err(e) = tracker.record(&entry).await {
                tracing::warn!(reference = %reference, error = %e, "could not record processed post");
            }
        }

        ItemOutcome::Published { result, media_id }
    }
}
