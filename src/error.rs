use std::time::Duration;

use thiserror::Error;

use crate::scraper::types::AttemptRecord;

/// Failure of a single page fetch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
}

impl From<worker::Error> for FetchError {
    fn from(e: worker::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

/// Why a raw-scan candidate was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotHttps,
    NotMp4,
    ContainsMarkup,
    ContainsXml,
    UnknownHost,
    TooShort,
    TooLong,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::NotHttps => "not an https url",
            RejectReason::NotMp4 => "no .mp4 in url",
            RejectReason::ContainsMarkup => "contains angle brackets",
            RejectReason::ContainsXml => "contains xml",
            RejectReason::UnknownHost => "not an approved cdn host",
            RejectReason::TooShort => "shorter than the minimum length",
            RejectReason::TooLong => "longer than the maximum length",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input does not resolve to any known post URL shape.
    #[error("no known path variant matches {0:?}")]
    NoMatchingPathVariant(String),

    /// Every attempt failed at the network level; carries the last failure.
    #[error("fetching {url} failed: {reason}")]
    FetchFailed {
        url: String,
        reason: FetchError,
        attempts: Vec<AttemptRecord>,
    },

    /// At least one page was fetched but no strategy produced a video URL.
    #[error("no extraction strategy matched {reference} after {} attempts", attempts.len())]
    ParseFailed {
        reference: String,
        attempts: Vec<AttemptRecord>,
        /// Body of the last fetched page, kept for offline inspection.
        last_body: Option<String>,
    },

    #[error("rejected candidate {candidate:?}: {reason}")]
    InvalidCandidateRejected {
        candidate: String,
        reason: RejectReason,
    },
}

impl ExtractError {
    /// Stable name of the failure kind, used in JSON error bodies and batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::NoMatchingPathVariant(_) => "NoMatchingPathVariant",
            ExtractError::FetchFailed { .. } => "FetchFailed",
            ExtractError::ParseFailed { .. } => "ParseFailed",
            ExtractError::InvalidCandidateRejected { .. } => "InvalidCandidateRejected",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ExtractError::NoMatchingPathVariant(_) => 400,
            ExtractError::FetchFailed { .. } => 502,
            ExtractError::ParseFailed { .. } | ExtractError::InvalidCandidateRejected { .. } => 404,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("graph api request failed: {0}")]
    Request(String),
    #[error("graph api returned an unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("permission denied by graph api (code {code:?}): {message}")]
    Permission { code: Option<i64>, message: String },
    #[error("media container {container_id} failed processing")]
    Processing { container_id: String },
    #[error("media container {container_id} not ready after {polls} status checks")]
    NotReady { container_id: String, polls: u32 },
}

impl From<worker::Error> for PublishError {
    fn from(e: worker::Error) -> Self {
        PublishError::Request(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker storage error: {0}")]
    Storage(String),
    #[error("tracker entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<worker::Error> for TrackerError {
    fn from(e: worker::Error) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

impl From<worker::kv::KvError> for TrackerError {
    fn from(e: worker::kv::KvError) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("unknown path variant {0:?}")]
    UnknownPathVariant(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let err = ExtractError::NoMatchingPathVariant("nope".into());
        assert_eq!(err.kind(), "NoMatchingPathVariant");
        assert_eq!(err.http_status(), 400);

        let err = ExtractError::ParseFailed {
            reference: "ABC".into(),
            attempts: Vec::new(),
            last_body: None,
        };
        assert_eq!(err.kind(), "ParseFailed");
        assert_eq!(err.http_status(), 404);
        assert_eq!(
            err.to_string(),
            "no extraction strategy matched ABC after 0 attempts"
        );
    }

    #[test]
    fn rejection_message_names_reason() {
        let err = ExtractError::InvalidCandidateRejected {
            candidate: "https://x".into(),
            reason: RejectReason::TooShort,
        };
        assert!(err.to_string().contains("shorter than the minimum length"));
    }
}
