//! Access-token JWT codec.
//!
//! Tokens are HS256 JWTs carrying the owning user (`sub`), the bound
//! profile (`spr`, optional), a per-token nonce (`yggt`), and the
//! client token fixed at mint time (`ctk`). `exp` marks the end of the
//! refresh window; the shorter validity window is enforced by the
//! token engine from `iat`, not by the JWT layer.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AuthError;
use crate::ids::new_simple_id;

/// Validity window: tokens are *valid* for 15 minutes from issue.
pub const DEFAULT_VALIDITY_SECS: i64 = 15 * 60;

/// Refresh window: *stale* tokens stay refreshable for 14 days.
pub const DEFAULT_REFRESH_SECS: i64 = 14 * 24 * 60 * 60;

/// Claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Owning user id.
    pub sub: String,
    /// Selected profile id, when one is bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spr: Option<String>,
    /// Per-token nonce; the unit of revocation.
    pub yggt: String,
    /// Client token supplied (or allocated) at mint time.
    pub ctk: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// End of the refresh window (unix seconds).
    pub exp: i64,
}

/// Mint a signed access token. Returns the compact string and the
/// claims it carries.
pub fn mint_token(
    user_id: &str,
    selected_profile: Option<&str>,
    client_token: &str,
    refresh_secs: i64,
    secret: &[u8],
) -> Result<(String, TokenClaims), AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        spr: selected_profile.map(str::to_string),
        yggt: new_simple_id(),
        ctk: client_token.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(refresh_secs)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Encoding(format!("jwt encode: {e}")))?;
    Ok((token, claims))
}

/// Decode and verify a token. Rejects anything past the refresh
/// window; validity-window staleness is the caller's concern.
pub fn decode_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Decode a token ignoring expiry, for idempotent invalidation of
/// whatever the caller presents. The signature is still verified.
pub fn decode_token_allow_expired(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
}

/// Resolve the token-signing secret: env `ASKR_TOKEN_SECRET`, then the
/// persisted secret file, else generate and persist one.
pub fn resolve_token_secret(path: &Path) -> String {
    if let Ok(secret) = std::env::var("ASKR_TOKEN_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, &secret);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    info!(path = %path.display(), "generated new token secret");
    secret
}

/// Default location of the persisted token secret, next to the RSA
/// keys.
pub fn default_secret_path(keys_dir: &Path) -> PathBuf {
    keys_dir.join("token.secret")
}
