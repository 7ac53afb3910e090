//! Token and credential logic.
//!
//! Provides password verification, the access-token JWT codec, and the
//! [`tokens::TokenEngine`] implementing the authenticate / refresh /
//! validate / invalidate / signout lifecycle.

pub mod jwt;
pub mod password;
pub mod tokens;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors. Message texts are what the HTTP layer puts
/// on the wire.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Invalid username or password.")]
    InvalidCredentials,

    #[error("Invalid token.")]
    InvalidToken,

    /// Past the validity window but inside the refresh window:
    /// refusable for authenticated use, still acceptable to refresh.
    #[error("Token expired.")]
    TokenExpired,

    /// Join presented a profile id other than the one bound to the
    /// token.
    #[error("Selected profile does not match the access token.")]
    SelectedProfileMismatch,

    /// Refresh tried to select a profile on a token that already has
    /// one bound.
    #[error("Access token already has a profile assigned.")]
    ProfileAlreadySelected,

    /// Refresh tried to select a profile the token's user does not
    /// own.
    #[error("Selected profile does not belong to the user.")]
    ProfileNotOwned,

    #[error("token encoding: {0}")]
    Encoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
