//! Profile lookup handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use askr_core::ids;
use askr_core::models::wire::ProfileRef;
use askr_core::store::{StoreError, with_deadline};
use askr_core::textures;
use askr_core::validation::{self, MAX_BATCH_NAMES};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{ValidJson, json_bytes};

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    unsigned: Option<String>,
}

impl ProfileQuery {
    /// `unsigned` defaults to true; unparsable values keep the
    /// default.
    fn unsigned(&self) -> bool {
        self.unsigned
            .as_deref()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true)
    }
}

/// `GET /sessionserver/session/minecraft/profile/{uuid}`
pub async fn profile_by_uuid(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Response> {
    let uuid = ids::normalize(&uuid);
    if !validation::is_valid_uuid(&uuid) {
        return Err(ApiError::IllegalArgument("malformed profile id".into()));
    }
    let signed = !query.unsigned();

    if let Some(bytes) = state.cache.get_profile(&uuid, signed) {
        return Ok(json_bytes(bytes));
    }

    let profile = match with_deadline(state.store.get_profile_by_uuid(&uuid)).await {
        Ok(profile) => profile,
        Err(StoreError::NotFound) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => return Err(e.into()),
    };

    let doc = textures::assemble_profile(&profile, &state.keys, signed)?;
    let bytes = serde_json::to_vec(&doc)?;
    state.cache.put_profile(&uuid, signed, bytes.clone());
    Ok(json_bytes(bytes))
}

/// `POST /api/profiles/minecraft`: batch name lookup, at most 10
/// names.
pub async fn profiles_by_names(
    State(state): State<AppState>,
    ValidJson(names): ValidJson<Vec<String>>,
) -> ApiResult<Json<Vec<ProfileRef>>> {
    if names.len() > MAX_BATCH_NAMES {
        return Err(ApiError::ForbiddenOperation(
            "Too many profiles requested.".into(),
        ));
    }
    let names: Vec<String> = names
        .into_iter()
        .filter(|n| validation::is_valid_player_name(n))
        .collect();

    let profiles = with_deadline(state.store.get_profiles_by_names(&names)).await?;
    // Always an array, never null.
    Ok(Json(
        profiles
            .iter()
            .map(|p| ProfileRef {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect(),
    ))
}

/// `GET /users/profiles/minecraft/{username}`
pub async fn profile_by_name(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Response> {
    // A name outside the legal shape cannot exist; treat it as a miss.
    if !validation::is_valid_player_name(&username) {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    match with_deadline(state.store.get_profile_by_name(&username)).await {
        Ok(profile) => Ok(Json(ProfileRef {
            id: profile.id,
            name: profile.name,
        })
        .into_response()),
        Err(StoreError::NotFound) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => Err(e.into()),
    }
}
