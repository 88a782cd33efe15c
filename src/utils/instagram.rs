/// Path segments that are followed by a post shortcode.
const POST_SEGMENTS: [&str; 4] = ["p", "reel", "reels", "tv"];

/// Longest shortcode we accept. Real ones are 11 characters, private ones longer.
const MAX_SHORTCODE_LEN: usize = 64;

/// Returns true if `code` only uses Instagram's shortcode alphabet.
pub fn is_valid_shortcode(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_SHORTCODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Returns true for `instagram.com` and any of its subdomains.
pub fn is_instagram_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "instagram.com" || host.ends_with(".instagram.com")
}

/// Extracts the post ID (shortcode) from an Instagram URL path.
///
/// Handles paths like `/p/ABC123/`, `/reel/ABC123/`, `/tv/ABC123/`,
/// `/username/reel/ABC123/`, with or without trailing slashes and extra
/// path segments.
pub fn extract_post_id(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for (i, segment) in segments.iter().enumerate() {
        if POST_SEGMENTS.contains(segment) {
            return segments.get(i + 1).map(|s| s.to_string());
        }
    }

    None
}

/// Keeps the lines of a batch input that look like post URLs.
pub fn post_url_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains("instagram.com"))
        .map(String::from)
        .collect()
}
