use worker::*;

use super::types::{ExtractionResult, PostReference};

/// CDN URLs carry an expiry token, so results are only kept briefly.
const RESULT_TTL_SECONDS: u64 = 3600;
const DIAGNOSTIC_TTL_SECONDS: u64 = 7 * 86400;
pub const KV_BINDING: &str = "CACHE";

fn result_key(reference: &PostReference) -> String {
    format!("result:{reference}")
}

fn diagnostic_key(reference: &PostReference) -> String {
    format!("debug:{reference}")
}

pub async fn get_cached(reference: &PostReference, env: &Env) -> Result<Option<ExtractionResult>> {
    let kv = env.kv(KV_BINDING)?;

    match kv.get(&result_key(reference)).text().await? {
        Some(json) => {
            let data: ExtractionResult = serde_json::from_str(&json)
                .map_err(|e| Error::RustError(format!("cache deserialize error: {e}")))?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

pub async fn set_cached(reference: &PostReference, data: &ExtractionResult, env: &Env) -> Result<()> {
    let kv = env.kv(KV_BINDING)?;
    let json = serde_json::to_string(data)
        .map_err(|e| Error::RustError(format!("cache serialize error: {e}")))?;

    kv.put(&result_key(reference), json)?
        .expiration_ttl(RESULT_TTL_SECONDS)
        .execute()
        .await?;

    Ok(())
}

/// Stores the body of a page no strategy could read, for offline inspection.
pub async fn save_diagnostic(reference: &PostReference, body: &str, env: &Env) -> Result<()> {
    let kv = env.kv(KV_BINDING)?;

    kv.put(&diagnostic_key(reference), body.to_string())?
        .expiration_ttl(DIAGNOSTIC_TTL_SECONDS)
        .execute()
        .await?;

    tracing::info!(reference = %reference, key = %diagnostic_key(reference), len = body.len(), "saved diagnostic page");
    Ok(())
}
