//! Last-resort scan of the raw page text for CDN `.mp4` URLs.
//!
//! Naive matches here routinely capture truncated or HTML-escaped garbage, so
//! every candidate goes through [`validate_candidate`] before it is accepted.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ExtractError, RejectReason};
use crate::utils::escape::unescape_url;

/// Host substrings a scanned video URL must contain.
pub const DEFAULT_CDN_HOSTS: [&str; 3] = ["scontent", "cdninstagram", "fbcdn"];

/// Candidates must be strictly longer than this...
const MIN_CANDIDATE_LEN: usize = 50;
/// ...and strictly shorter than this.
const MAX_CANDIDATE_LEN: usize = 500;

// `https:` followed by two slashes, either of which may be JSON-escaped.
const SCHEME: &str = r"https:\\?/\\?/";

static SCAN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // double-quoted
        format!(r#"(?i)"({SCHEME}[^"]*scontent[^"]*\.mp4[^"]*)""#),
        format!(r#"(?i)"({SCHEME}[^"]*cdninstagram[^"]*\.mp4[^"]*)""#),
        format!(r#"(?i)"({SCHEME}[^"]*fbcdn[^"]*\.mp4[^"]*)""#),
        format!(r#"(?i)"({SCHEME}[^"]*\.mp4[^"]*)""#),
        // single-quoted
        format!(r#"(?i)'({SCHEME}[^']*scontent[^']*\.mp4[^']*)'"#),
        format!(r#"(?i)'({SCHEME}[^']*cdninstagram[^']*\.mp4[^']*)'"#),
        format!(r#"(?i)'({SCHEME}[^']*\.mp4[^']*)'"#),
        // unquoted
        format!(r#"(?i)({SCHEME}scontent[^\s"']+\.mp4[^\s"']*)"#),
        format!(r#"(?i)({SCHEME}cdninstagram[^\s"']+\.mp4[^\s"']*)"#),
        format!(r#"(?i)({SCHEME}[^\s"']*fbcdn[^\s"']*\.mp4[^\s"']*)"#),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Checks a cleaned candidate against the shape of a real CDN video URL.
pub fn validate_candidate(candidate: &str, cdn_hosts: &[String]) -> Result<(), ExtractError> {
    let reason = if !candidate.starts_with("https://") {
        Some(RejectReason::NotHttps)
    } else if !candidate.contains(".mp4") {
        Some(RejectReason::NotMp4)
    } else if candidate.contains('<') || candidate.contains('>') {
        Some(RejectReason::ContainsMarkup)
    } else if candidate.contains("xml") {
        Some(RejectReason::ContainsXml)
    } else if !cdn_hosts.iter().any(|host| candidate.contains(host.as_str())) {
        Some(RejectReason::UnknownHost)
    } else if candidate.len() <= MIN_CANDIDATE_LEN {
        Some(RejectReason::TooShort)
    } else if candidate.len() >= MAX_CANDIDATE_LEN {
        Some(RejectReason::TooLong)
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ExtractError::InvalidCandidateRejected {
            candidate: candidate.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Outcome of a raw scan: the accepted URL, if any, plus every rejection.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub url: Option<String>,
    pub rejected: Vec<ExtractError>,
}

/// Scans `text` with each pattern in order; the first valid candidate wins.
pub fn scan(text: &str, cdn_hosts: &[String]) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for pattern in SCAN_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(raw) = caps.get(1) else { continue };
            let candidate = unescape_url(raw.as_str().trim_matches(|c| c == '"' || c == '\''));

            match validate_candidate(&candidate, cdn_hosts) {
                Ok(()) => {
                    outcome.url = Some(candidate);
                    return outcome;
                }
                Err(rejection) => {
                    tracing::debug!(%rejection, "raw scan candidate rejected");
                    outcome.rejected.push(rejection);
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> Vec<String> {
        DEFAULT_CDN_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    const GOOD: &str = "https://scontent-mxp1-1.cdninstagram.com/v/t50.2886-16/4272_n.mp4?_nc_ht=x&oh=00_Af&oe=65D5";

    fn reason(candidate: &str) -> Option<RejectReason> {
        match validate_candidate(candidate, &hosts()) {
            Ok(()) => None,
            Err(ExtractError::InvalidCandidateRejected { reason, .. }) => Some(reason),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn accepts_real_cdn_url() {
        assert_eq!(reason(GOOD), None);
    }

    #[test]
    fn rejects_short_candidates() {
        assert_eq!(reason("https://scontent.x/a.mp4"), Some(RejectReason::TooShort));
    }

    #[test]
    fn rejects_markup_even_when_host_matches() {
        let candidate = format!("{GOOD}<br");
        assert_eq!(reason(&candidate), Some(RejectReason::ContainsMarkup));
    }

    #[test]
    fn rejects_xml_long_and_foreign() {
        assert_eq!(reason(&format!("{GOOD}&f=xml")), Some(RejectReason::ContainsXml));
        assert_eq!(reason(&format!("{GOOD}{}", "a".repeat(500))), Some(RejectReason::TooLong));
        assert_eq!(
            reason("https://video.example.org/some/long/path/to/a/file/clip_0001.mp4?token=abc"),
            Some(RejectReason::UnknownHost)
        );
        assert_eq!(reason("http://scontent.cdninstagram.com/v/t50/long_file_name_here.mp4"), Some(RejectReason::NotHttps));
    }

    #[test]
    fn scan_finds_escaped_quoted_url() {
        let escaped = GOOD.replace('/', "\\/");
        let text = format!(r#"<script>var a = {{"x":"{escaped}"}};</script>"#);
        let outcome = scan(&text, &hosts());
        assert_eq!(outcome.url.as_deref(), Some(GOOD));
    }

    #[test]
    fn scan_skips_garbage_before_good_candidate() {
        let text = format!(
            r#"<a href="https://scontent.x/a.mp4">short</a> <p>'{GOOD}'</p>"#
        );
        let outcome = scan(&text, &hosts());
        assert_eq!(outcome.url.as_deref(), Some(GOOD));
        assert!(outcome
            .rejected
            .iter()
            .any(|r| matches!(r, ExtractError::InvalidCandidateRejected { reason: RejectReason::TooShort, .. })));
    }

    #[test]
    fn scan_reports_nothing_on_plain_page() {
        let outcome = scan("<html><body>no video here</body></html>", &hosts());
        assert!(outcome.url.is_none());
        assert!(outcome.rejected.is_empty());
    }
}
