//! Access-token lifecycle engine.
//!
//! Tokens are stateless-by-default: validity is signature plus the two
//! time windows. The engine keeps only what statelessness cannot
//! express: a revocation set of token nonces and a per-user signout
//! epoch, both in sharded maps so no operation blocks outside a
//! single bucket.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use super::jwt::{self, DEFAULT_REFRESH_SECS, DEFAULT_VALIDITY_SECS, TokenClaims};
use super::AuthError;
use crate::ids::new_simple_id;
use crate::models::profile::Profile;
use crate::store::{ProfileStore, StoreError, with_deadline};

/// Where a decoded token sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Inside the validity window: good for authenticated requests.
    Valid,
    /// Past validity, inside the refresh window: only `refresh` may
    /// act on it.
    Stale,
}

/// Result of a successful authenticate.
pub struct AuthOutcome {
    pub access_token: String,
    pub client_token: String,
    pub available_profiles: Vec<Profile>,
    pub selected_profile: Option<Profile>,
    pub user_id: String,
}

/// Result of a successful refresh.
pub struct RefreshOutcome {
    pub access_token: String,
    pub client_token: String,
    pub selected_profile: Option<Profile>,
    pub user_id: String,
}

/// Mint, validate, refresh, invalidate and revoke access tokens.
pub struct TokenEngine {
    store: Arc<dyn ProfileStore>,
    secret: Vec<u8>,
    validity_secs: i64,
    refresh_secs: i64,
    /// Revoked token nonce -> unix second after which the entry may be
    /// garbage-collected (the token's own refresh-window end).
    revoked: DashMap<String, i64>,
    /// User id -> signout epoch; tokens issued strictly before the
    /// epoch are treated as revoked.
    user_epochs: DashMap<String, i64>,
}

impl TokenEngine {
    pub fn new(store: Arc<dyn ProfileStore>, secret: impl Into<Vec<u8>>) -> Self {
        Self::with_windows(store, secret, DEFAULT_VALIDITY_SECS, DEFAULT_REFRESH_SECS)
    }

    /// Engine with explicit windows (tests shrink these).
    pub fn with_windows(
        store: Arc<dyn ProfileStore>,
        secret: impl Into<Vec<u8>>,
        validity_secs: i64,
        refresh_secs: i64,
    ) -> Self {
        Self {
            store,
            secret: secret.into(),
            validity_secs,
            refresh_secs,
            revoked: DashMap::new(),
            user_epochs: DashMap::new(),
        }
    }

    /// Decode a token and run the local (store-free) checks:
    /// signature, refresh-window expiry, revocation, signout epoch.
    fn inspect(&self, access_token: &str) -> Result<(TokenClaims, TokenState), AuthError> {
        let claims = jwt::decode_token(access_token, &self.secret)?;
        if self.revoked.contains_key(&claims.yggt) {
            return Err(AuthError::InvalidToken);
        }
        if let Some(epoch) = self.user_epochs.get(&claims.sub)
            && claims.iat < *epoch
        {
            return Err(AuthError::InvalidToken);
        }
        let state = if Utc::now().timestamp() < claims.iat + self.validity_secs {
            TokenState::Valid
        } else {
            TokenState::Stale
        };
        Ok((claims, state))
    }

    fn check_client_token(claims: &TokenClaims, client_token: Option<&str>) -> Result<(), AuthError> {
        match client_token {
            Some(ct) if ct != claims.ctk => Err(AuthError::InvalidToken),
            _ => Ok(()),
        }
    }

    /// Authenticate with login + password, minting a fresh token. The
    /// token binds a profile iff the user owns exactly one.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_token: Option<String>,
    ) -> Result<AuthOutcome, AuthError> {
        let user = self.credentials_check(username, password).await?;

        let client_token = client_token.unwrap_or_else(new_simple_id);
        let selected_profile = match user.profiles.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let (access_token, _) = jwt::mint_token(
            &user.id,
            selected_profile.as_ref().map(|p| p.id.as_str()),
            &client_token,
            self.refresh_secs,
            &self.secret,
        )?;
        debug!(user = %user.id, "minted access token");
        Ok(AuthOutcome {
            access_token,
            client_token,
            available_profiles: user.profiles,
            selected_profile,
            user_id: user.id,
        })
    }

    /// Exchange a valid-or-stale token for a fresh one. The old nonce
    /// is revoked before the new token becomes observable.
    pub async fn refresh(
        &self,
        access_token: &str,
        client_token: Option<&str>,
        selected_profile: Option<&str>,
    ) -> Result<RefreshOutcome, AuthError> {
        let (claims, _) = self.inspect(access_token)?;
        Self::check_client_token(&claims, client_token)?;

        let user = match with_deadline(self.store.get_user_by_id(&claims.sub)).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidToken),
            Err(e) => return Err(e.into()),
        };

        let binding = match (selected_profile, claims.spr.as_deref()) {
            // Selecting onto a token that already names a profile is a
            // contract violation, not a mismatch.
            (Some(_), Some(_)) => return Err(AuthError::ProfileAlreadySelected),
            (Some(requested), None) => Some(
                user.profile_by_id(requested)
                    .cloned()
                    .ok_or(AuthError::ProfileNotOwned)?,
            ),
            // A previously bound profile must still exist.
            (None, Some(bound)) => Some(
                user.profile_by_id(bound)
                    .cloned()
                    .ok_or(AuthError::InvalidToken)?,
            ),
            (None, None) => None,
        };

        self.revoked.insert(claims.yggt.clone(), claims.exp);
        let (access_token, _) = jwt::mint_token(
            &user.id,
            binding.as_ref().map(|p| p.id.as_str()),
            &claims.ctk,
            self.refresh_secs,
            &self.secret,
        )?;
        debug!(user = %user.id, "refreshed access token");
        Ok(RefreshOutcome {
            access_token,
            client_token: claims.ctk,
            selected_profile: binding,
            user_id: user.id,
        })
    }

    /// Succeeds only for tokens in the *valid* state whose user (and
    /// bound profile, if any) still exist.
    pub async fn validate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let (claims, state) = self.inspect(access_token)?;
        Self::check_client_token(&claims, client_token)?;
        if state == TokenState::Stale {
            return Err(AuthError::TokenExpired);
        }
        let user = match with_deadline(self.store.get_user_by_id(&claims.sub)).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidToken),
            Err(e) => return Err(e.into()),
        };
        if let Some(spr) = &claims.spr
            && user.profile_by_id(spr).is_none()
        {
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    /// Record the token's nonce in the revocation set. Idempotent;
    /// undecodable or already-revoked tokens are a no-op.
    pub fn invalidate(&self, access_token: &str) {
        if let Ok(claims) = jwt::decode_token_allow_expired(access_token, &self.secret) {
            self.revoked.insert(claims.yggt, claims.exp);
        }
    }

    /// Credential-checked revocation of every token the user holds,
    /// via the per-user epoch.
    pub async fn signout(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let user = self.credentials_check(username, password).await?;
        self.user_epochs.insert(user.id.clone(), Utc::now().timestamp());
        debug!(user = %user.id, "signed out all tokens");
        Ok(())
    }

    /// Verify a join attempt: the token must be *valid* and bound to
    /// exactly the profile the client claims.
    pub async fn verify_join(
        &self,
        access_token: &str,
        selected_profile: &str,
    ) -> Result<TokenClaims, AuthError> {
        let (claims, state) = self.inspect(access_token)?;
        if state == TokenState::Stale {
            return Err(AuthError::TokenExpired);
        }
        match claims.spr.as_deref() {
            Some(bound) if bound == selected_profile => Ok(claims),
            _ => Err(AuthError::SelectedProfileMismatch),
        }
    }

    /// Drop revocation entries whose tokens have left the refresh
    /// window; they can no longer be presented anyway.
    pub fn sweep_revocations(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.revoked.len();
        self.revoked.retain(|_, drop_after| *drop_after > now);
        self.user_epochs
            .retain(|_, epoch| *epoch + self.refresh_secs > now);
        before - self.revoked.len()
    }

    async fn credentials_check(
        &self,
        username: &str,
        password: &str,
    ) -> Result<crate::models::profile::User, AuthError> {
        let user = match with_deadline(self.store.get_user_by_login(username)).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        if !with_deadline(self.store.verify_password(&user, password)).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProfileStore;

    const SECRET: &str = "engine-test-secret";

    fn engine() -> (TokenEngine, String) {
        let store = Arc::new(MemoryProfileStore::new(false));
        let profile_id = store.seed_demo().unwrap();
        (TokenEngine::new(store, SECRET), profile_id)
    }

    /// Engine whose validity window is zero: every minted token is
    /// immediately stale.
    fn stale_engine() -> TokenEngine {
        let store = Arc::new(MemoryProfileStore::new(false));
        store.seed_demo().unwrap();
        TokenEngine::with_windows(store, SECRET, 0, DEFAULT_REFRESH_SECS)
    }

    #[tokio::test]
    async fn mint_then_validate() {
        let (engine, profile_id) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        assert_eq!(out.selected_profile.as_ref().unwrap().id, profile_id);
        engine.validate(&out.access_token, None).await.unwrap();
        engine
            .validate(&out.access_token, Some(&out.client_token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.authenticate("test1@example.com", "nope", None).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            engine.authenticate("ghost@example.com", "password123", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn client_token_mismatch_is_invalid() {
        let (engine, _) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", Some("my-client".into()))
            .await
            .unwrap();
        assert_eq!(out.client_token, "my-client");
        assert!(matches!(
            engine.validate(&out.access_token, Some("other-client")).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn refresh_revokes_the_old_token() {
        let (engine, _) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        let refreshed = engine.refresh(&out.access_token, None, None).await.unwrap();

        assert!(matches!(
            engine.validate(&out.access_token, None).await,
            Err(AuthError::InvalidToken)
        ));
        engine.validate(&refreshed.access_token, None).await.unwrap();
        assert_eq!(refreshed.client_token, out.client_token);
        assert_eq!(
            refreshed.selected_profile.unwrap().id,
            out.selected_profile.unwrap().id
        );
    }

    #[tokio::test]
    async fn stale_token_refuses_validate_but_refreshes() {
        let engine = stale_engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        assert!(matches!(
            engine.validate(&out.access_token, None).await,
            Err(AuthError::TokenExpired)
        ));
        engine.refresh(&out.access_token, None, None).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_rejects_reselection() {
        let (engine, profile_id) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        // The seeded user owns one profile, so it is already bound.
        assert!(matches!(
            engine.refresh(&out.access_token, None, Some(&profile_id)).await,
            Err(AuthError::ProfileAlreadySelected)
        ));
    }

    #[tokio::test]
    async fn refresh_rejects_unowned_profile() {
        let store = Arc::new(MemoryProfileStore::new(false));
        store.seed_demo().unwrap();
        // A second user with two profiles gets an unbound token.
        let p1 = Profile::named(new_simple_id(), "AltOne");
        let p2 = Profile::named(new_simple_id(), "AltTwo");
        store
            .add_user("alt@example.com", "hunter22", vec![p1, p2])
            .unwrap();
        let engine = TokenEngine::new(store, SECRET);

        let out = engine
            .authenticate("alt@example.com", "hunter22", None)
            .await
            .unwrap();
        assert!(out.selected_profile.is_none());
        assert_eq!(out.available_profiles.len(), 2);

        assert!(matches!(
            engine
                .refresh(&out.access_token, None, Some("f".repeat(32).as_str()))
                .await,
            Err(AuthError::ProfileNotOwned)
        ));

        // Selecting an owned profile binds it.
        let wanted = out.available_profiles[1].id.clone();
        let refreshed = engine
            .refresh(&out.access_token, None, Some(&wanted))
            .await
            .unwrap();
        assert_eq!(refreshed.selected_profile.unwrap().id, wanted);
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let (engine, _) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        engine.invalidate(&out.access_token);
        engine.invalidate(&out.access_token);
        engine.invalidate("not-even-a-token");
        assert!(matches!(
            engine.validate(&out.access_token, None).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn signout_revokes_earlier_tokens() {
        let (engine, _) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        // Epoch comparison is strict on issue second.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        engine.signout("test1@example.com", "password123").await.unwrap();
        assert!(matches!(
            engine.validate(&out.access_token, None).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            engine.signout("test1@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn join_requires_matching_bound_profile() {
        let (engine, profile_id) = engine();
        let out = engine
            .authenticate("test1@example.com", "password123", None)
            .await
            .unwrap();
        engine
            .verify_join(&out.access_token, &profile_id)
            .await
            .unwrap();
        assert!(matches!(
            engine
                .verify_join(&out.access_token, &"0".repeat(32))
                .await,
            Err(AuthError::SelectedProfileMismatch)
        ));
    }

    #[tokio::test]
    async fn revocation_sweep_drops_expired_entries() {
        let store = Arc::new(MemoryProfileStore::new(false));
        store.seed_demo().unwrap();
        // Refresh window already over: revocation entries are
        // immediately collectable.
        let engine = TokenEngine::with_windows(store, SECRET, 0, -1);
        let (token, _) =
            jwt::mint_token("u", None, "c", -1, SECRET.as_bytes()).unwrap();
        engine.invalidate(&token);
        assert_eq!(engine.sweep_revocations(), 1);
    }
}
