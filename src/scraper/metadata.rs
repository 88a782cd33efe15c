//! Strategies that read what the page declares about itself: OpenGraph meta
//! tags, JSON-LD blocks and the `<title>`.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::utils::escape::unescape_url;

/// Meta properties that may carry the video location, best first.
const VIDEO_META_PROPERTIES: [&str; 3] = ["og:video", "og:video:secure_url", "og:video:url"];

static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

fn meta_content(doc: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(String::from)
}

/// Strategy 1 (video): `og:video` and friends.
pub fn meta_video(doc: &Html) -> Option<String> {
    VIDEO_META_PROPERTIES
        .iter()
        .find_map(|property| meta_content(doc, property))
        .map(|url| unescape_url(&url))
}

/// Strategy 1 (caption): `og:description`.
pub fn meta_caption(doc: &Html) -> Option<String> {
    meta_content(doc, "og:description")
}

/// Parsed JSON-LD roots. Blocks that are not valid JSON are skipped.
fn linked_data_roots(doc: &Html) -> Vec<Value> {
    doc.select(&LD_JSON)
        .filter_map(|el| serde_json::from_str::<Value>(&el.text().collect::<String>()).ok())
        .flat_map(|root| match root {
            Value::Array(items) => items,
            other => vec![other],
        })
        .collect()
}

/// Video nodes of a JSON-LD root: its `video` field (object or array), or the
/// root itself when it is a `VideoObject`.
fn video_nodes(root: &Value) -> Vec<&Value> {
    let mut nodes: Vec<&Value> = match root.get("video") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(video @ Value::Object(_)) => vec![video],
        _ => Vec::new(),
    };
    if root.get("@type").and_then(Value::as_str) == Some("VideoObject") {
        nodes.push(root);
    }
    nodes
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Strategy 2 (video): nested `contentUrl` in linked-data blocks.
pub fn linked_data_video(doc: &Html) -> Option<String> {
    linked_data_roots(doc)
        .iter()
        .flat_map(|root| video_nodes(root))
        .find_map(|node| string_field(node, "contentUrl"))
        .map(|url| unescape_url(&url))
}

/// Strategy 2 (caption): video `description`, then the root `description`.
pub fn linked_data_caption(doc: &Html) -> Option<String> {
    let roots = linked_data_roots(doc);
    roots
        .iter()
        .flat_map(|root| video_nodes(root))
        .find_map(|node| string_field(node, "description"))
        .or_else(|| roots.iter().find_map(|root| string_field(root, "description")))
}

/// Strategy 5 (caption only): the page title, unless it is just the site brand.
pub fn title_caption(doc: &Html, brand_name: &str) -> Option<String> {
    let title = doc.select(&TITLE).next()?.text().collect::<String>();
    let title = title.trim();
    if title.is_empty() || title.contains(brand_name) {
        return None;
    }
    Some(title.to_string())
}
