//! `/sessionserver` handlers: the join/hasJoined rendezvous.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use askr_core::ids;
use askr_core::models::wire::JoinRequest;
use askr_core::session::PendingSession;
use askr_core::store::{StoreError, with_deadline};
use askr_core::textures;
use askr_core::validation;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ValidJson;

/// `ConnectInfo<SocketAddr>`, but missing the extension (e.g. no
/// `into_make_service_with_connect_info`) yields `None` instead of a
/// rejection — axum 0.8 dropped the blanket `Option<T>` extractor for
/// `ConnectInfo`, so this reimplements the same fallback directly.
pub(crate) struct MaybeConnectInfo(Option<SocketAddr>);

impl<S> FromRequestParts<S> for MaybeConnectInfo
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeConnectInfo(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// `POST /sessionserver/session/minecraft/join`
pub async fn join(
    State(state): State<AppState>,
    headers: HeaderMap,
    MaybeConnectInfo(connect_info): MaybeConnectInfo,
    ValidJson(body): ValidJson<JoinRequest>,
) -> ApiResult<StatusCode> {
    if body.server_id.is_empty() {
        return Err(ApiError::IllegalArgument("serverId is required".into()));
    }
    let profile_id = ids::normalize(&body.selected_profile);
    if !validation::is_valid_uuid(&profile_id) {
        return Err(ApiError::IllegalArgument("malformed profile id".into()));
    }

    state
        .tokens
        .verify_join(&body.access_token, &profile_id)
        .await?;

    state.sessions.insert(
        &body.server_id,
        PendingSession::new(body.access_token, profile_id, client_ip(&headers, connect_info)),
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct HasJoinedParams {
    username: Option<String>,
    #[serde(rename = "serverId")]
    server_id: Option<String>,
    ip: Option<String>,
}

/// `GET /sessionserver/session/minecraft/hasJoined`
///
/// Every kind of miss (no session, expired session, IP mismatch,
/// unknown username, session consumed by a concurrent call) answers
/// 204.
pub async fn has_joined(
    State(state): State<AppState>,
    Query(params): Query<HasJoinedParams>,
) -> ApiResult<Response> {
    let (Some(username), Some(server_id)) = (params.username, params.server_id) else {
        return Err(ApiError::IllegalArgument(
            "username and serverId are required".into(),
        ));
    };
    if username.is_empty() || server_id.is_empty() {
        return Err(ApiError::IllegalArgument(
            "username and serverId are required".into(),
        ));
    }

    let Some(session) = state.sessions.get_valid(&server_id, params.ip.as_deref()) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let profile = match with_deadline(state.store.get_profile_by_name(&username)).await {
        Ok(profile) => profile,
        Err(StoreError::NotFound) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => return Err(e.into()),
    };

    // The resolved profile must be the one that joined.
    if profile.id != session.profile_id {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    // One-shot: the first hasJoined wins, replays miss.
    if !state.sessions.consume(&server_id) {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let doc = textures::assemble_profile(&profile, &state.keys, true)?;
    Ok(Json(doc).into_response())
}

/// Best-effort client address: proxy headers first, then the socket
/// peer. String comparison only; normalization is a deployment
/// concern.
fn client_ip(headers: &HeaderMap, connect_info: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok())
        && !real_ip.is_empty()
    {
        return real_ip.to_string();
    }
    connect_info.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());
        assert_eq!(client_ip(&headers, None), "1.2.3.4");
    }

    #[test]
    fn client_ip_falls_back_to_peer_addr() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "5.6.7.8:1234".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(addr)), "5.6.7.8");
        assert_eq!(client_ip(&headers, None), "");
    }
}
