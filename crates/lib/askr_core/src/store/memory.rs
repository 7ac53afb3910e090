//! In-memory profile store.
//!
//! Sharded maps keyed by id with secondary indexes for login and
//! profile name. Name lookups are case-insensitive on the index but
//! return the profile's canonical casing.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::password;
use crate::ids::new_simple_id;
use crate::models::profile::{Profile, SkinModel, User};

use super::{ProfileStore, StoreError};

/// Seedable in-memory implementation of [`ProfileStore`].
pub struct MemoryProfileStore {
    users: DashMap<String, User>,
    login_index: DashMap<String, String>,
    profiles: DashMap<String, Profile>,
    name_index: DashMap<String, String>,
    owner_index: DashMap<String, String>,
    non_email_login: bool,
}

impl MemoryProfileStore {
    pub fn new(non_email_login: bool) -> Self {
        Self {
            users: DashMap::new(),
            login_index: DashMap::new(),
            profiles: DashMap::new(),
            name_index: DashMap::new(),
            owner_index: DashMap::new(),
            non_email_login,
        }
    }

    /// Insert a user with a plaintext password (bcrypt-hashed here)
    /// and the given profiles. Returns the new user id.
    pub fn add_user(
        &self,
        email: &str,
        password: &str,
        profiles: Vec<Profile>,
    ) -> Result<String, StoreError> {
        let user_id = new_simple_id();
        let password_hash =
            password::hash(password).map_err(|e| StoreError::Internal(e.to_string()))?;

        for profile in &profiles {
            self.profiles.insert(profile.id.clone(), profile.clone());
            self.name_index
                .insert(profile.name.to_ascii_lowercase(), profile.id.clone());
            self.owner_index.insert(profile.id.clone(), user_id.clone());
        }
        let user = User {
            id: user_id.clone(),
            email: email.to_string(),
            password_hash,
            profiles,
        };
        self.login_index
            .insert(email.to_ascii_lowercase(), user_id.clone());
        self.users.insert(user_id.clone(), user);
        Ok(user_id)
    }

    /// Replace a profile's textures. Callers holding derived responses
    /// (signed-profile cache entries) must invalidate them.
    pub fn update_profile_textures(
        &self,
        uuid: &str,
        skin_url: Option<String>,
        cape_url: Option<String>,
        skin_model: SkinModel,
    ) -> Result<(), StoreError> {
        let mut profile = self.profiles.get_mut(uuid).ok_or(StoreError::NotFound)?;
        profile.skin_url = skin_url;
        profile.cape_url = cape_url;
        profile.skin_model = skin_model;
        let updated = profile.clone();
        drop(profile);

        // Keep the copy embedded in the owning user in sync.
        if let Some(owner) = self.owner_index.get(uuid) {
            if let Some(mut user) = self.users.get_mut(owner.value()) {
                if let Some(p) = user.profiles.iter_mut().find(|p| p.id == uuid) {
                    *p = updated;
                }
            }
        }
        Ok(())
    }

    /// Seed the fixtures used by the demo deployment and tests: user
    /// `test1@example.com` / `password123` owning the textured profile
    /// `Tester`.
    pub fn seed_demo(&self) -> Result<String, StoreError> {
        let profile = Profile {
            id: new_simple_id(),
            name: "Tester".into(),
            skin_url: Some("http://textures.example.com/skin/tester.png".into()),
            cape_url: None,
            skin_model: SkinModel::Classic,
        };
        let profile_id = profile.id.clone();
        self.add_user("test1@example.com", "password123", vec![profile])?;
        Ok(profile_id)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile_by_uuid(&self, uuid: &str) -> Result<Profile, StoreError> {
        self.profiles
            .get(uuid)
            .map(|p| p.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn get_profile_by_name(&self, name: &str) -> Result<Profile, StoreError> {
        let id = self
            .name_index
            .get(&name.to_ascii_lowercase())
            .map(|e| e.value().clone())
            .ok_or(StoreError::NotFound)?;
        self.get_profile_by_uuid(&id).await
    }

    async fn get_profiles_by_names(&self, names: &[String]) -> Result<Vec<Profile>, StoreError> {
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(profile) = self.get_profile_by_name(name).await {
                found.push(profile);
            }
        }
        Ok(found)
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        if let Some(id) = self.login_index.get(&login.to_ascii_lowercase()) {
            return self.get_user_by_id(id.value()).await;
        }
        // Fall back to profile-name login when the feature is enabled.
        if self.non_email_login && !login.contains('@') {
            let profile = self.get_profile_by_name(login).await?;
            if let Some(owner) = self.owner_index.get(&profile.id) {
                return self.get_user_by_id(owner.value()).await;
            }
        }
        Err(StoreError::NotFound)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.users
            .get(id)
            .map(|u| u.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn verify_password(&self, user: &User, password: &str) -> Result<bool, StoreError> {
        password::verify(password, &user.password_hash)
            .map_err(|e| StoreError::Internal(e.to_string()))
    }
}
