use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractError;
use crate::utils::instagram::{extract_post_id, is_instagram_host, is_valid_shortcode};

/// Shortcode identifying one post across its `/p/`, `/reel/` and `/tv/` paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostReference(String);

impl PostReference {
    /// Accepts either a bare shortcode or a full post URL.
    pub fn parse(input: &str) -> Result<Self, ExtractError> {
        let trimmed = input.trim();

        if is_valid_shortcode(trimmed) {
            return Ok(PostReference(trimmed.to_string()));
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let parsed = Url::parse(&with_scheme)
            .map_err(|_| ExtractError::NoMatchingPathVariant(input.to_string()))?;

        if !parsed.host_str().is_some_and(is_instagram_host) {
            return Err(ExtractError::NoMatchingPathVariant(input.to_string()));
        }

        extract_post_id(parsed.path())
            .filter(|code| is_valid_shortcode(code))
            .map(PostReference)
            .ok_or_else(|| ExtractError::NoMatchingPathVariant(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One canonical page path under which a post can be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathVariant {
    Reel,
    #[serde(rename = "p")]
    Post,
    Tv,
}

impl PathVariant {
    pub const DEFAULT_ORDER: [PathVariant; 3] = [PathVariant::Reel, PathVariant::Post, PathVariant::Tv];

    pub fn segment(self) -> &'static str {
        match self {
            PathVariant::Reel => "reel",
            PathVariant::Post => "p",
            PathVariant::Tv => "tv",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment.trim() {
            "reel" | "reels" => Some(PathVariant::Reel),
            "p" => Some(PathVariant::Post),
            "tv" => Some(PathVariant::Tv),
            _ => None,
        }
    }

    pub fn page_url(self, base_url: &str, reference: &PostReference) -> String {
        format!(
            "{}/{}/{}/",
            base_url.trim_end_matches('/'),
            self.segment(),
            reference
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub video_url: String,
    pub caption: String,
}

/// Which strategy produced the video URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    MetaTag,
    LinkedData,
    VideoVersions,
    InlineField(&'static str),
    ShortcodeMedia,
    RawScan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success { source: VideoSource },
    Timeout,
    FetchFailed { reason: String },
    ParseFailed,
}

/// What happened when one path variant was tried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub index: usize,
    pub variant: PathVariant,
    pub url: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_shortcode() {
        let reference = PostReference::parse("  DA1b2_c-3 ").unwrap();
        assert_eq!(reference.as_str(), "DA1b2_c-3");
    }

    #[test]
    fn parses_reel_and_post_urls() {
        for input in [
            "https://www.instagram.com/reel/ABC123/",
            "https://instagram.com/p/ABC123/?igsh=xyz",
            "instagram.com/tv/ABC123",
            "https://www.instagram.com/someone/reel/ABC123/",
            "https://www.instagram.com/reels/ABC123/",
        ] {
            assert_eq!(PostReference::parse(input).unwrap().as_str(), "ABC123", "{input}");
        }
    }

    #[test]
    fn rejects_foreign_hosts_and_unknown_paths() {
        for input in [
            "https://example.com/reel/ABC123/",
            "https://www.instagram.com/explore/tags/cats/",
            "https://www.instagram.com/",
            "not a url at all",
        ] {
            let err = PostReference::parse(input).unwrap_err();
            assert!(matches!(err, ExtractError::NoMatchingPathVariant(_)), "{input}");
        }
    }

    #[test]
    fn builds_page_urls() {
        let reference = PostReference::parse("ABC").unwrap();
        assert_eq!(
            PathVariant::Reel.page_url("https://www.instagram.com/", &reference),
            "https://www.instagram.com/reel/ABC/"
        );
        assert_eq!(
            PathVariant::Tv.page_url("https://www.instagram.com", &reference),
            "https://www.instagram.com/tv/ABC/"
        );
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = ExtractionResult {
            video_url: "https://cdn/x.mp4".into(),
            caption: "hi".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["videoUrl"], "https://cdn/x.mp4");
        assert_eq!(json["caption"], "hi");
    }
}
