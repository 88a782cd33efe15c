use std::time::Duration;

use serde_json::Value;
use url::Url;
use worker::{Fetch, Headers, Method, Request, RequestInit};

use super::{ContainerStatus, GraphApi};
use crate::config::GraphConfig;
use crate::error::PublishError;
use crate::scraper::fetch::{Pause, WorkerPause};

/// Graph API error codes that mean the token lacks a permission.
const PERMISSION_CODES: [i64; 2] = [10, 190];

/// Graph API client for Instagram business accounts over `Fetch`.
pub struct GraphApiClient {
    config: GraphConfig,
}

impl GraphApiClient {
    pub fn new(config: GraphConfig) -> Self {
        GraphApiClient { config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.api_version,
            path
        )
    }

    async fn post_form(&self, path: &str, pairs: &[(&str, &str)]) -> Result<Value, PublishError> {
        let headers = Headers::new();
        headers.set("Content-Type", "application/x-www-form-urlencoded")?;

        let mut init = RequestInit::new();
        init.with_method(Method::Post)
            .with_headers(headers)
            .with_body(Some(form_urlencode(pairs).into()));

        let request = Request::new_with_init(&self.endpoint(path), &init)?;
        let mut resp = Fetch::Request(request).send().await?;
        let status = resp.status_code();
        let text = resp.text().await?;
        tracing::debug!(path, status, len = text.len(), "graph api POST");
        parse_graph_response(status, &text)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PublishError> {
        let mut url = Url::parse(&self.endpoint(path))
            .map_err(|e| PublishError::Request(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);

        let mut resp = Fetch::Url(url).send().await?;
        let status = resp.status_code();
        let text = resp.text().await?;
        tracing::debug!(path, status, len = text.len(), "graph api GET");
        parse_graph_response(status, &text)
    }
}

impl Pause for GraphApiClient {
    async fn pause(&self, duration: Duration) {
        WorkerPause.pause(duration).await
    }
}

impl GraphApi for GraphApiClient {
    async fn create_container(&self, video_url: &str, caption: &str) -> Result<String, PublishError> {
        let path = format!("{}/media", self.config.ig_user_id);
        let json = self
            .post_form(
                &path,
                &[
                    ("media_type", "REELS"),
                    ("video_url", video_url),
                    ("caption", caption),
                    ("access_token", self.config.access_token.as_str()),
                ],
            )
            .await?;
        id_field(&json)
    }

    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus, PublishError> {
        let json = self
            .get(
                container_id,
                &[("fields", "status_code"), ("access_token", self.config.access_token.as_str())],
            )
            .await?;
        json.get("status_code")
            .and_then(Value::as_str)
            .map(ContainerStatus::from_code)
            .ok_or_else(|| PublishError::UnexpectedResponse(json.to_string()))
    }

    async fn publish_container(&self, container_id: &str) -> Result<String, PublishError> {
        let path = format!("{}/media_publish", self.config.ig_user_id);
        let json = self
            .post_form(
                &path,
                &[
                    ("creation_id", container_id),
                    ("access_token", self.config.access_token.as_str()),
                ],
            )
            .await?;
        id_field(&json)
    }
}

fn id_field(json: &Value) -> Result<String, PublishError> {
    json.get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| PublishError::UnexpectedResponse(json.to_string()))
}

/// Turns a Graph API response into its JSON body or a typed error.
fn parse_graph_response(status: u16, text: &str) -> Result<Value, PublishError> {
    let json: Value = serde_json::from_str(text).map_err(|_| {
        let snippet: String = text.chars().take(200).collect();
        PublishError::UnexpectedResponse(format!("status {status}: {snippet}"))
    })?;

    if let Some(error) = json.get("error") {
        let code = error.get("code").and_then(Value::as_i64);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();

        let is_permission = status == 403
            || code.is_some_and(|c| PERMISSION_CODES.contains(&c) || (200..300).contains(&c));
        if is_permission {
            return Err(PublishError::Permission { code, message });
        }
        return Err(PublishError::Request(format!("status {status} code {code:?}: {message}")));
    }

    if !(200..300).contains(&status) {
        return Err(PublishError::UnexpectedResponse(format!("status {status}: {json}")));
    }

    Ok(json)
}

/// Simple form URL encoding for key-value pairs.
fn form_urlencode(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
