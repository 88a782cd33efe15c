/// Literal escape sequences that show up in URLs scraped out of inline JSON.
const URL_ESCAPES: [(&str, &str); 8] = [
    ("\\u0026", "&"),
    ("\\u003D", "="),
    ("\\u003d", "="),
    ("\\u003F", "?"),
    ("\\u003f", "?"),
    ("\\/", "/"),
    ("&amp;", "&"),
    ("\\", ""),
];

/// Normalizes a URL scraped out of page text.
///
/// Converts encoded `&`, `=`, `?` and escaped slashes back to literal
/// characters and drops any backslash left over.
pub fn unescape_url(raw: &str) -> String {
    let mut out = raw.trim().to_string();
    for (from, to) in URL_ESCAPES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

/// Decodes the body of a JSON string literal (without the surrounding quotes).
fn decode_json_fragment(raw: &str) -> Option<String> {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).ok()
}

/// Unescapes caption text captured from inline script.
///
/// Tries a full JSON string decode first so `\uXXXX` surrogate pairs become
/// emoji; falls back to replacing the common sequences one by one.
pub fn unescape_caption(raw: &str) -> String {
    if let Some(decoded) = decode_json_fragment(raw) {
        return decoded;
    }

    raw.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\u0026", "&")
        .replace("\\u003C", "<")
        .replace("\\u003c", "<")
        .replace("\\u003E", ">")
        .replace("\\u003e", ">")
        .replace("\\/", "/")
}

/// Escapes a string for safe embedding in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_unescapes_json_sequences() {
        assert_eq!(
            unescape_url(r"https:\/\/scontent.cdninstagram.com\/v\/a.mp4?x=1\u0026y\u003D2"),
            "https://scontent.cdninstagram.com/v/a.mp4?x=1&y=2"
        );
    }

    #[test]
    fn url_unescapes_question_mark_and_entities() {
        assert_eq!(
            unescape_url(r"https://cdn/a.mp4?oe=1&amp;oh=2"),
            "https://cdn/a.mp4?oe=1&oh=2"
        );
    }

    #[test]
    fn url_drops_stray_backslashes() {
        assert_eq!(unescape_url(r"https://cdn/a\.mp4"), "https://cdn/a.mp4");
    }

    #[test]
    fn url_passthrough_plain() {
        assert_eq!(unescape_url("https://cdn/a.mp4"), "https://cdn/a.mp4");
    }

    #[test]
    fn caption_decodes_emoji_surrogates() {
        assert_eq!(unescape_caption(r"cat \ud83d\udc31\nline"), "cat \u{1F431}\nline");
    }

    #[test]
    fn caption_falls_back_on_invalid_json() {
        // A lone backslash before `q` is not a valid JSON escape.
        assert_eq!(
            unescape_caption(r#"say \"hi\" \q & more"#),
            "say \"hi\" \\q & more"
        );
    }

    #[test]
    fn html_escape_covers_quotes() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }
}
