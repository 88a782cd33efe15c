pub mod batch;
pub mod extract;
pub mod home;
pub mod media;

use serde::Serialize;
use worker::*;

use crate::error::{ConfigError, ExtractError};

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

/// JSON failure body for an extraction error, with its mapped status.
pub fn extract_error_response(err: &ExtractError) -> Result<Response> {
    Ok(Response::from_json(&ErrorBody {
        error: err.kind(),
        message: err.to_string(),
    })?
    .with_status(err.http_status()))
}

/// Misconfigured vars are a deployment problem, reported as 500.
pub fn config_error_response(err: &ConfigError) -> Result<Response> {
    tracing::error!(error = %err, "invalid configuration");
    Ok(Response::from_json(&ErrorBody {
        error: "ConfigError",
        message: err.to_string(),
    })?
    .with_status(500))
}
