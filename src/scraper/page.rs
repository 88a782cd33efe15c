use scraper::Html;

use super::inline_script::{inline_caption, inline_video, shortcode_media};
use super::metadata::{linked_data_caption, linked_data_video, meta_caption, meta_video, title_caption};
use super::raw_scan;
use super::types::VideoSource;
use crate::config::{CaptionStrategy, ExtractorConfig, VideoStrategy};
use crate::error::ExtractError;

/// What one page yielded. The video and caption chains run independently.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub video: Option<(String, VideoSource)>,
    pub caption: Option<String>,
    pub rejected: Vec<ExtractError>,
}

/// Runs the configured strategy chains over a single page body.
pub fn extract_page(html: &str, config: &ExtractorConfig) -> PageExtraction {
    let doc = Html::parse_document(html);
    let mut extraction = PageExtraction::default();

    for strategy in &config.video_strategies {
        let found = match strategy {
            VideoStrategy::MetaTags => meta_video(&doc).map(|url| (url, VideoSource::MetaTag)),
            VideoStrategy::LinkedData => linked_data_video(&doc).map(|url| (url, VideoSource::LinkedData)),
            VideoStrategy::InlineScript => inline_video(html, &config.video_field_patterns),
            VideoStrategy::RawScan => {
                let outcome = raw_scan::scan(html, &config.cdn_hosts);
                extraction.rejected.extend(outcome.rejected);
                outcome.url.map(|url| (url, VideoSource::RawScan))
            }
        };

        if let Some((url, source)) = found.filter(|(url, _)| !url.is_empty()) {
            tracing::debug!(?strategy, ?source, "video strategy succeeded");
            extraction.video = Some((url, source));
            break;
        }
    }

    for strategy in &config.caption_strategies {
        let found = match strategy {
            CaptionStrategy::MetaTags => meta_caption(&doc),
            CaptionStrategy::LinkedData => linked_data_caption(&doc),
            CaptionStrategy::InlineScript => inline_caption(html, &config.caption_patterns)
                .or_else(|| shortcode_media(html).and_then(|media| media.caption)),
            CaptionStrategy::Title => title_caption(&doc, &config.brand_name),
        };

        if let Some(caption) = found {
            tracing::debug!(?strategy, "caption strategy succeeded");
            extraction.caption = Some(caption);
            break;
        }
    }

    extraction
}
