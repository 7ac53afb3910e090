//! Domain and wire models.
//!
//! `profile` holds the internal domain records owned by the profile
//! store; `wire` holds the serde types matching the Yggdrasil JSON
//! surface (camelCase field names, optional fields omitted).

pub mod profile;
pub mod wire;

pub use profile::{Profile, SkinModel, User};
pub use wire::*;
