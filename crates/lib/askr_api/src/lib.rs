//! # askr_api
//!
//! HTTP layer for the askr Yggdrasil-compatible auth service: the
//! fixed URL surface, wire-format error mapping, and the response
//! cache in front of descriptor and profile serialization.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use askr_core::auth::tokens::TokenEngine;
use askr_core::keys::SignatureKeys;
use askr_core::session::SessionStore;
use askr_core::store::ProfileStore;

use crate::cache::ResponseCache;
use crate::config::ApiConfig;
use crate::handlers::{auth, meta, profile, session};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The external system of record for users and profiles.
    pub store: Arc<dyn ProfileStore>,
    /// Access-token lifecycle engine.
    pub tokens: Arc<TokenEngine>,
    /// Join/hasJoined rendezvous.
    pub sessions: Arc<SessionStore>,
    /// RSA signing key material.
    pub keys: Arc<SignatureKeys>,
    /// Serialized-response cache.
    pub cache: Arc<ResponseCache>,
    /// Server configuration.
    pub config: ApiConfig,
}

/// Builds the axum router with the fixed Yggdrasil URL surface.
pub fn router(state: AppState) -> Router {
    // Launchers and game servers call this API cross-origin without
    // credentials; a permissive read/write CORS policy is enough.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(meta::api_metadata))
        .route("/authserver/authenticate", post(auth::authenticate))
        .route("/authserver/refresh", post(auth::refresh))
        .route("/authserver/validate", post(auth::validate))
        .route("/authserver/invalidate", post(auth::invalidate))
        .route("/authserver/signout", post(auth::signout))
        .route("/sessionserver/session/minecraft/join", post(session::join))
        .route(
            "/sessionserver/session/minecraft/hasJoined",
            get(session::has_joined),
        )
        .route(
            "/sessionserver/session/minecraft/profile/{uuid}",
            get(profile::profile_by_uuid),
        )
        .route("/api/profiles/minecraft", post(profile::profiles_by_names))
        .route(
            "/users/profiles/minecraft/{username}",
            get(profile::profile_by_name),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
