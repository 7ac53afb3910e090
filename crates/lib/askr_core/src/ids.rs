//! Identifier helpers.
//!
//! The Yggdrasil wire format carries UUIDs as unhyphenated lowercase
//! 32-hex strings. Everything in this crate stores and compares ids in
//! that form; hyphenated input is normalized at the HTTP boundary.

use uuid::Uuid;

/// Generate a new random id in unhyphenated lowercase hex form.
pub fn new_simple_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalize an externally supplied id: strip hyphens, lowercase.
pub fn normalize(id: &str) -> String {
    id.replace('-', "").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_id_is_32_hex() {
        let id = new_simple_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!id.contains('-'));
    }

    #[test]
    fn normalize_strips_hyphens_and_case() {
        assert_eq!(
            normalize("069A79F4-44E9-4726-A5BE-FCA90E38AAF5"),
            "069a79f444e94726a5befca90e38aaf5"
        );
    }
}
