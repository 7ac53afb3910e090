//! Internal domain models for users and profiles.

use serde::{Deserialize, Serialize};

/// Skin model variant. The wire format only distinguishes the slim
/// ("Alex") arms from the default; classic skins carry no metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkinModel {
    #[default]
    Classic,
    Slim,
}

/// A named, UUID-identified persona owned by a user.
///
/// `id` is an unhyphenated lowercase 32-hex string. Profile names are
/// unique at any instant but are not stable identifiers; only ids are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub skin_url: Option<String>,
    pub cape_url: Option<String>,
    pub skin_model: SkinModel,
}

impl Profile {
    /// A profile with a name and no textures.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            skin_url: None,
            cape_url: None,
            skin_model: SkinModel::Classic,
        }
    }
}

/// A user account as seen by the core. The password verifier is opaque
/// here; only the store interprets it.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub profiles: Vec<Profile>,
}

impl User {
    /// The profile owned by this user with the given id, if any.
    pub fn profile_by_id(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }
}
