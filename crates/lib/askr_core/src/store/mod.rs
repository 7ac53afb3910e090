//! Profile store collaborator contract.
//!
//! The backing store for users and profiles is external to the core;
//! this trait is the boundary. The in-process [`MemoryProfileStore`]
//! implements it for tests and single-node deployments.

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::profile::{Profile, User};

pub use memory::MemoryProfileStore;

/// Deadline applied to every store call made on behalf of a request.
pub const STORE_DEADLINE: Duration = Duration::from_secs(5);

/// Store failures. `NotFound` is a semantic result at some boundaries
/// (profile lookup misses map to 204); everything else is internal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("store error: {0}")]
    Internal(String),
}

/// Read access to users and profiles, plus password verification.
///
/// Password verifiers are opaque to the core; the store owns the
/// hashing scheme.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile by unhyphenated lowercase UUID.
    async fn get_profile_by_uuid(&self, uuid: &str) -> Result<Profile, StoreError>;

    /// Profile by current display name (exact match).
    async fn get_profile_by_name(&self, name: &str) -> Result<Profile, StoreError>;

    /// Batch lookup; unknown names are silently dropped from the
    /// result, order is unspecified.
    async fn get_profiles_by_names(&self, names: &[String]) -> Result<Vec<Profile>, StoreError>;

    /// User by login identifier (email, or profile name when the
    /// deployment enables non-email login).
    async fn get_user_by_login(&self, login: &str) -> Result<User, StoreError>;

    /// User by id.
    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError>;

    /// Check a password against the user's stored verifier.
    async fn verify_password(&self, user: &User, password: &str) -> Result<bool, StoreError>;
}

/// Run a store call under [`STORE_DEADLINE`]. Timeouts surface as
/// internal errors, never as semantic misses.
pub async fn with_deadline<T, F>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(STORE_DEADLINE, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Internal("store call deadline exceeded".into())),
    }
}
