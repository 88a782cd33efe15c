//! Pattern tables for the JSON shapes Instagram has embedded in inline
//! `<script>` content over time. Each pattern is independent so dead ones can
//! be dropped from the config without touching the others.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::types::VideoSource;
use crate::utils::escape::{unescape_caption, unescape_url};

/// A named regex whose first capture group is the value of interest.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub name: &'static str,
    pub regex: Regex,
}

static VIDEO_VERSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""video_versions"\s*:\s*(\[\{[^\]]+\}\])"#).unwrap());

static VIDEO_URL_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""video_url"\s*:\s*"([^"]+)""#).unwrap());
static PLAYBACK_URL_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""playback_url"\s*:\s*"([^"]+)""#).unwrap());
static MP4_SRC_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""src"\s*:\s*"([^"]+\.mp4[^"]*)""#).unwrap());

static CAPTION_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""edge_media_to_caption"\s*:\s*\{\s*"edges"\s*:\s*\[\s*\{\s*"node"\s*:\s*\{\s*"text"\s*:\s*"((?:[^"\\]|\\.)+)""#,
    )
    .unwrap()
});
static CAPTION_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""caption"\s*:\s*"((?:[^"\\]|\\.)+)""#).unwrap());
static TEXT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""text"\s*:\s*"((?:[^"\\]|\\.)+)""#).unwrap());

/// Field patterns tried after `video_versions`, in order.
pub fn default_video_field_patterns() -> Vec<FieldPattern> {
    vec![
        FieldPattern {
            name: "video_url",
            regex: VIDEO_URL_FIELD.clone(),
        },
        FieldPattern {
            name: "playback_url",
            regex: PLAYBACK_URL_FIELD.clone(),
        },
        FieldPattern {
            name: "mp4_src",
            regex: MP4_SRC_FIELD.clone(),
        },
    ]
}

/// Caption patterns in the order the page shapes have been seen in the wild.
pub fn default_caption_patterns() -> Vec<FieldPattern> {
    vec![
        FieldPattern {
            name: "caption",
            regex: CAPTION_FIELD.clone(),
        },
        FieldPattern {
            name: "text",
            regex: TEXT_FIELD.clone(),
        },
        FieldPattern {
            name: "edge_media_to_caption",
            regex: CAPTION_EDGE.clone(),
        },
    ]
}

/// Runs the inline video chain: `video_versions`, field patterns, then the
/// legacy `shortcode_media` blob.
pub fn inline_video(html: &str, field_patterns: &[FieldPattern]) -> Option<(String, VideoSource)> {
    if let Some(url) = video_versions_url(html) {
        return Some((url, VideoSource::VideoVersions));
    }
    if let Some((url, name)) = field_pattern_url(html, field_patterns) {
        return Some((url, VideoSource::InlineField(name)));
    }
    shortcode_media(html)
        .and_then(|media| media.video_url)
        .map(|url| (url, VideoSource::ShortcodeMedia))
}

/// Picks a URL out of the first parseable `video_versions` array, preferring
/// an entry whose URL contains `.mp4` over the first entry.
pub fn video_versions_url(html: &str) -> Option<String> {
    VIDEO_VERSIONS.captures_iter(html).find_map(|caps| {
        let versions: Vec<Value> = serde_json::from_str(&caps[1]).ok()?;
        let urls: Vec<&str> = versions
            .iter()
            .filter_map(|v| v.get("url").and_then(Value::as_str))
            .filter(|url| !url.is_empty())
            .collect();
        let best = urls
            .iter()
            .find(|url| url.contains(".mp4"))
            .or_else(|| urls.first())?;
        Some(unescape_url(best))
    })
}

/// First match across `patterns` that unescapes to an absolute `.mp4` URL.
pub fn field_pattern_url(html: &str, patterns: &[FieldPattern]) -> Option<(String, &'static str)> {
    patterns.iter().find_map(|pattern| {
        pattern.regex.captures_iter(html).find_map(|caps| {
            let url = unescape_url(caps.get(1)?.as_str());
            (url.starts_with("http") && url.contains(".mp4")).then_some((url, pattern.name))
        })
    })
}

/// Caption from the first matching pattern.
pub fn inline_caption(html: &str, patterns: &[FieldPattern]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(html)?;
        let caption = unescape_caption(caps.get(1)?.as_str());
        let caption = caption.trim();
        (!caption.is_empty()).then(|| caption.to_string())
    })
}

/// Fields pulled out of an embedded `shortcode_media` object.
#[derive(Debug, Default, PartialEq)]
pub struct ShortcodeMedia {
    pub video_url: Option<String>,
    pub caption: Option<String>,
}

/// Reads the legacy `shortcode_media` / `xdt_shortcode_media` blob, as found
/// in `window._sharedData` and older GraphQL payloads.
pub fn shortcode_media(html: &str) -> Option<ShortcodeMedia> {
    ["\"shortcode_media\":", "\"xdt_shortcode_media\":"]
        .iter()
        .filter_map(|needle| extract_balanced_object(html, needle))
        .filter_map(|json| serde_json::from_str::<Value>(&json).ok())
        .map(|media| parse_shortcode_media(&media))
        .find(|media| media.video_url.is_some() || media.caption.is_some())
}

fn parse_shortcode_media(media: &Value) -> ShortcodeMedia {
    let video_url = media
        .get("video_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(unescape_url);

    let caption = media
        .get("edge_media_to_caption")
        .and_then(|c| c.get("edges"))
        .and_then(|e| e.as_array())
        .and_then(|arr| arr.first())
        .and_then(|edge| edge.get("node"))
        .and_then(|node| node.get("text"))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    ShortcodeMedia { video_url, caption }
}

/// Locates `needle` in the HTML and extracts the balanced JSON object after it.
fn extract_balanced_object(html: &str, needle: &str) -> Option<String> {
    let start = html.find(needle)?;
    let json_start = start + needle.len();

    // Only whitespace may sit between the key and the opening brace.
    let rest = &html[json_start..];
    let brace_offset = rest.find(|c: char| !c.is_whitespace())?;
    if !rest[brace_offset..].starts_with('{') {
        return None;
    }
    let obj_start = json_start + brace_offset;

    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in html[obj_start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(html[obj_start..obj_start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_versions_prefers_mp4_entry() {
        let html = r#"<script>{"video_versions":[{"url":"https://x/b.gif"},{"url":"https://x/a.mp4"}]}</script>"#;
        assert_eq!(video_versions_url(html).as_deref(), Some("https://x/a.mp4"));

        let html = r#"{"video_versions":[{"url":"https://x/a.mp4"},{"url":"https://x/b.gif"}]}"#;
        assert_eq!(video_versions_url(html).as_deref(), Some("https://x/a.mp4"));
    }

    #[test]
    fn video_versions_takes_first_without_mp4() {
        let html = r#"{"video_versions":[{"type":101,"url":"https://x/one"},{"url":"https://x/two"}]}"#;
        assert_eq!(video_versions_url(html).as_deref(), Some("https://x/one"));
    }

    #[test]
    fn video_versions_skips_unparseable_match() {
        let html = r#"{"video_versions":[{"url":broken}]} {"video_versions":[{"url":"https:\/\/x\/ok.mp4"}]}"#;
        assert_eq!(video_versions_url(html).as_deref(), Some("https://x/ok.mp4"));
    }

    #[test]
    fn field_patterns_in_order_with_validation() {
        let patterns = default_video_field_patterns();
        let html = r#"{"video_url":"/relative/path.mp4","playback_url":"https:\/\/cdn\/p.mp4?a=1&b=2"}"#;
        assert_eq!(
            field_pattern_url(html, &patterns),
            Some(("https://cdn/p.mp4?a=1&b=2".to_string(), "playback_url"))
        );
    }

    #[test]
    fn field_pattern_src_requires_mp4() {
        let patterns = default_video_field_patterns();
        assert_eq!(field_pattern_url(r#"{"src":"https://cdn/pic.jpg"}"#, &patterns), None);
        assert_eq!(
            field_pattern_url(r#"{"src":"https://cdn/clip.mp4"}"#, &patterns),
            Some(("https://cdn/clip.mp4".to_string(), "mp4_src"))
        );
    }

    #[test]
    fn removing_a_pattern_disables_it() {
        let patterns: Vec<FieldPattern> = default_video_field_patterns()
            .into_iter()
            .filter(|p| p.name != "video_url")
            .collect();
        assert_eq!(field_pattern_url(r#"{"video_url":"https://cdn/v.mp4"}"#, &patterns), None);
    }

    #[test]
    fn shortcode_media_blob() {
        let html = r#"<script>window._sharedData = {"entry_data":{"PostPage":[{"graphql":{"shortcode_media":
            {"is_video":true,"video_url":"https://cdn/legacy.mp4","note":"a } in a string",
             "edge_media_to_caption":{"edges":[{"node":{"text":"legacy caption"}}]}}}}]}};</script>"#;
        assert_eq!(
            shortcode_media(html),
            Some(ShortcodeMedia {
                video_url: Some("https://cdn/legacy.mp4".into()),
                caption: Some("legacy caption".into()),
            })
        );
        assert_eq!(
            inline_video(html, &[]),
            Some(("https://cdn/legacy.mp4".to_string(), VideoSource::ShortcodeMedia))
        );
    }

    #[test]
    fn xdt_shortcode_media_blob() {
        let html = r#"{"data":{"xdt_shortcode_media":{"video_url":"https://cdn/x.mp4"}}}"#;
        assert_eq!(
            shortcode_media(html).and_then(|m| m.video_url).as_deref(),
            Some("https://cdn/x.mp4")
        );
    }

    #[test]
    fn caption_patterns_run_in_table_order() {
        let patterns = default_caption_patterns();
        let html = r#"{"text":"generic","caption":"plain caption","edge_media_to_caption":{"edges":[{"node":{"text":"edge"}}]}}"#;
        assert_eq!(inline_caption(html, &patterns).as_deref(), Some("plain caption"));

        let html = r#"{"text":"generic","edge_media_to_caption":{"edges":[{"node":{"text":"edge"}}]}}"#;
        assert_eq!(inline_caption(html, &patterns).as_deref(), Some("generic"));
        assert_eq!(inline_caption("<p>nothing</p>", &patterns), None);
    }

    #[test]
    fn edge_caption_is_unescaped() {
        let patterns = default_caption_patterns();
        let html = r#"{"edge_media_to_caption":{"edges":[{"node":{"text":"Line one\nsaid \"hi\""}}]}}"#;
        assert_eq!(
            inline_caption(html, &patterns).as_deref(),
            Some("Line one\nsaid \"hi\"")
        );
        assert_eq!(patterns.iter().map(|p| p.name).collect::<Vec<_>>(), ["caption", "text", "edge_media_to_caption"]);
    }
}
