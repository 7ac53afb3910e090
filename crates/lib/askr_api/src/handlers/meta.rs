//! `GET /`: the API descriptor.

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::Response;

use askr_core::models::wire::{ApiMetadata, MetaInfo};

use crate::AppState;
use crate::error::ApiResult;
use crate::handlers::json_bytes;

/// Serve the per-host API descriptor through the metadata cache.
pub async fn api_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(&state.config.server_host)
        .to_string();

    if let Some(bytes) = state.cache.get_metadata(&host) {
        return Ok(json_bytes(bytes));
    }
    let bytes = render_metadata(&state, &host)?;
    state.cache.put_metadata(&host, bytes.clone());
    Ok(json_bytes(bytes))
}

/// Deterministic descriptor for (config, host, keypair).
pub fn render_metadata(state: &AppState, host: &str) -> Result<Vec<u8>, serde_json::Error> {
    let metadata = ApiMetadata {
        meta: MetaInfo {
            server_name: state.config.server_name.clone(),
            implementation_name: "askr".to_string(),
            implementation_version: askr_core::version().to_string(),
            links: state.config.links(host),
            feature_non_email_login: state.config.non_email_login,
        },
        skin_domains: state.config.skin_domains.clone(),
        signature_public_key: state.keys.public_key_pem().to_string(),
    };
    serde_json::to_vec(&metadata)
}

/// Pre-render the descriptor for the canonical host so the first hit
/// is already a cache hit.
pub fn warm_metadata_cache(state: &AppState) {
    let host = state.config.server_host.clone();
    match render_metadata(state, &host) {
        Ok(bytes) => state.cache.put_metadata(&host, bytes),
        Err(e) => tracing::warn!(error = %e, "metadata warm-up failed"),
    }
}
