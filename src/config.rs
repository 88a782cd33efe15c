use std::time::Duration;

use worker::Env;

use crate::error::ConfigError;
use crate::scraper::inline_script::{default_caption_patterns, default_video_field_patterns, FieldPattern};
use crate::scraper::raw_scan::DEFAULT_CDN_HOSTS;
use crate::scraper::types::PathVariant;

pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com";
pub const DEFAULT_CAPTION: &str = "Reposted content";
pub const DEFAULT_BRAND_NAME: &str = "Instagram";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                      (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Video strategies, tried in order until one yields a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStrategy {
    MetaTags,
    LinkedData,
    InlineScript,
    RawScan,
}

/// Caption strategies, tried in order independently of the video chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionStrategy {
    MetaTags,
    LinkedData,
    InlineScript,
    Title,
}

/// Everything the extraction routine needs. Built once per request and
/// passed in explicitly.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub base_url: String,
    pub path_variants: Vec<PathVariant>,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub variant_delay: Duration,
    pub default_caption: String,
    pub brand_name: String,
    pub video_strategies: Vec<VideoStrategy>,
    pub caption_strategies: Vec<CaptionStrategy>,
    pub video_field_patterns: Vec<FieldPattern>,
    pub caption_patterns: Vec<FieldPattern>,
    pub cdn_hosts: Vec<String>,
    pub save_diagnostics: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            path_variants: PathVariant::DEFAULT_ORDER.to_vec(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(15),
            variant_delay: Duration::from_secs(1),
            default_caption: DEFAULT_CAPTION.to_string(),
            brand_name: DEFAULT_BRAND_NAME.to_string(),
            video_strategies: vec![
                VideoStrategy::MetaTags,
                VideoStrategy::LinkedData,
                VideoStrategy::InlineScript,
                VideoStrategy::RawScan,
            ],
            caption_strategies: vec![
                CaptionStrategy::MetaTags,
                CaptionStrategy::LinkedData,
                CaptionStrategy::InlineScript,
                CaptionStrategy::Title,
            ],
            video_field_patterns: default_video_field_patterns(),
            caption_patterns: default_caption_patterns(),
            cdn_hosts: DEFAULT_CDN_HOSTS.iter().map(|h| h.to_string()).collect(),
            save_diagnostics: false,
        }
    }
}

impl ExtractorConfig {
    pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env.var(key).ok().map(|v| v.to_string()))
    }

    /// Builds the config from any key/value source, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ExtractorConfig::default();

        if let Some(base) = non_empty(lookup("SOURCE_BASE_URL")) {
            config.base_url = base;
        }
        if let Some(raw) = non_empty(lookup("PATH_VARIANTS")) {
            config.path_variants = parse_path_variants(&raw)?;
        }
        if let Some(raw) = non_empty(lookup("FETCH_TIMEOUT_SECS")) {
            config.request_timeout = Duration::from_secs(parse_number("FETCH_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = non_empty(lookup("VARIANT_DELAY_MS")) {
            config.variant_delay = Duration::from_millis(parse_number("VARIANT_DELAY_MS", &raw)?);
        }
        if let Some(caption) = non_empty(lookup("DEFAULT_CAPTION")) {
            config.default_caption = caption;
        }
        if let Some(brand) = non_empty(lookup("BRAND_NAME")) {
            config.brand_name = brand;
        }
        if let Some(raw) = non_empty(lookup("SAVE_DIAGNOSTICS")) {
            config.save_diagnostics = parse_flag("SAVE_DIAGNOSTICS", &raw)?;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pause between posts; a courtesy to the source site.
    pub item_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            item_delay: Duration::from_secs(3),
        }
    }
}

impl BatchConfig {
    pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env.var(key).ok().map(|v| v.to_string()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = BatchConfig::default();
        if let Some(raw) = non_empty(lookup("ITEM_DELAY_SECS")) {
            config.item_delay = Duration::from_secs(parse_number("ITEM_DELAY_SECS", &raw)?);
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub api_base: String,
    pub api_version: String,
    pub ig_user_id: String,
    pub access_token: String,
    pub initial_wait: Duration,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl GraphConfig {
    /// Returns `None` when publishing is not configured.
    pub fn from_env(env: &Env) -> Result<Option<Self>, ConfigError> {
        let token = env.secret("GRAPH_ACCESS_TOKEN").ok().map(|s| s.to_string());
        Self::from_lookup(|key| match key {
            "GRAPH_ACCESS_TOKEN" => token.clone(),
            _ => env.var(key).ok().map(|v| v.to_string()),
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let (Some(access_token), Some(ig_user_id)) = (
            non_empty(lookup("GRAPH_ACCESS_TOKEN")),
            non_empty(lookup("IG_USER_ID")),
        ) else {
            return Ok(None);
        };

        let mut config = GraphConfig {
            api_base: "https://graph.facebook.com".to_string(),
            api_version: non_empty(lookup("GRAPH_API_VERSION")).unwrap_or_else(|| "v18.0".to_string()),
            ig_user_id,
            access_token,
            initial_wait: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            max_polls: 10,
        };

        if let Some(raw) = non_empty(lookup("GRAPH_MAX_POLLS")) {
            config.max_polls = u32::try_from(parse_number("GRAPH_MAX_POLLS", &raw)?).map_err(|_| {
                ConfigError::InvalidValue {
                    key: "GRAPH_MAX_POLLS",
                    value: raw.clone(),
                }
            })?;
        }

        Ok(Some(config))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_path_variants(raw: &str) -> Result<Vec<PathVariant>, ConfigError> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathVariant::from_segment(s).ok_or_else(|| ConfigError::UnknownPathVariant(s.trim().to_string())))
        .collect()
}
