//! # askr_core
//!
//! Core domain logic for the askr Yggdrasil-compatible authentication
//! and session service: access-token lifecycle, the join/hasJoined
//! rendezvous, RSA key material, and signed texture assembly.

pub mod auth;
pub mod ids;
pub mod keys;
pub mod models;
pub mod session;
pub mod store;
pub mod textures;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
