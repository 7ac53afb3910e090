//! `/authserver` handlers: token lifecycle.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use askr_core::ids;
use askr_core::models::profile::Profile;
use askr_core::models::wire::{
    AuthenticateRequest, AuthenticateResponse, InvalidateRequest, ProfileRef, RefreshRequest,
    RefreshResponse, SignoutRequest, UserInfo, ValidateRequest,
};
use askr_core::validation;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ValidJson;

fn profile_ref(profile: &Profile) -> ProfileRef {
    ProfileRef {
        id: profile.id.clone(),
        name: profile.name.clone(),
    }
}

/// Credential shape check shared by authenticate and signout. Shape
/// failures answer exactly like a credential mismatch so the boundary
/// does not leak which accounts exist.
fn check_login_shape(state: &AppState, username: &str, password: &str) -> ApiResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::IllegalArgument(
            "username and password are required".into(),
        ));
    }
    if !validation::is_valid_login(username, state.config.non_email_login)
        || !validation::is_valid_password(password)
    {
        return Err(ApiError::ForbiddenOperation(
            "Invalid credentials. Invalid username or password.".into(),
        ));
    }
    Ok(())
}

/// `POST /authserver/authenticate`
pub async fn authenticate(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<AuthenticateRequest>,
) -> ApiResult<Json<AuthenticateResponse>> {
    check_login_shape(&state, &body.username, &body.password)?;

    let outcome = state
        .tokens
        .authenticate(&body.username, &body.password, body.client_token)
        .await?;

    Ok(Json(AuthenticateResponse {
        access_token: outcome.access_token,
        client_token: outcome.client_token,
        available_profiles: outcome.available_profiles.iter().map(profile_ref).collect(),
        selected_profile: outcome.selected_profile.as_ref().map(profile_ref),
        user: body.request_user.then(|| UserInfo {
            id: outcome.user_id.clone(),
            properties: Vec::new(),
        }),
    }))
}

/// `POST /authserver/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let selected = match &body.selected_profile {
        Some(sel) => {
            let id = ids::normalize(&sel.id);
            if !validation::is_valid_uuid(&id) {
                return Err(ApiError::IllegalArgument("malformed profile id".into()));
            }
            Some(id)
        }
        None => None,
    };

    let outcome = state
        .tokens
        .refresh(
            &body.access_token,
            body.client_token.as_deref(),
            selected.as_deref(),
        )
        .await?;

    Ok(Json(RefreshResponse {
        access_token: outcome.access_token,
        client_token: outcome.client_token,
        selected_profile: outcome.selected_profile.as_ref().map(profile_ref),
        user: body.request_user.then(|| UserInfo {
            id: outcome.user_id.clone(),
            properties: Vec::new(),
        }),
    }))
}

/// `POST /authserver/validate`
pub async fn validate(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ValidateRequest>,
) -> ApiResult<StatusCode> {
    state
        .tokens
        .validate(&body.access_token, body.client_token.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /authserver/invalidate`. Always 204; idempotent.
pub async fn invalidate(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<InvalidateRequest>,
) -> StatusCode {
    state.tokens.invalidate(&body.access_token);
    StatusCode::NO_CONTENT
}

/// `POST /authserver/signout`
pub async fn signout(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<SignoutRequest>,
) -> ApiResult<StatusCode> {
    check_login_shape(&state, &body.username, &body.password)?;
    state.tokens.signout(&body.username, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
