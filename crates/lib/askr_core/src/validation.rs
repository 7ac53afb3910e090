//! Input shape validation.
//!
//! Precompiled patterns for the identifier shapes the protocol fixes:
//! emails (RFC-5322 shape, bounded length), unhyphenated 32-hex UUIDs,
//! and player names.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum email length per RFC 5321.
const MAX_EMAIL_LEN: usize = 254;

/// Maximum password length accepted at the boundary.
pub const MAX_PASSWORD_LEN: usize = 255;

/// Maximum number of names per batch profile lookup.
pub const MAX_BATCH_NAMES: usize = 10;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}$").unwrap());

static PLAYER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,16}$").unwrap());

/// Whether `email` is a plausible address within the length bound.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Whether `id` is an unhyphenated lowercase 32-hex UUID.
pub fn is_valid_uuid(id: &str) -> bool {
    id.len() == 32 && UUID_RE.is_match(id)
}

/// Whether `name` is a well-formed player name (`[A-Za-z0-9_]{3,16}`).
pub fn is_valid_player_name(name: &str) -> bool {
    PLAYER_NAME_RE.is_match(name)
}

/// Whether the authenticate/signout login input has an acceptable
/// shape: an email, or a player name when non-email login is allowed.
pub fn is_valid_login(username: &str, non_email_login: bool) -> bool {
    if username.contains('@') {
        is_valid_email(username)
    } else {
        non_email_login && is_valid_player_name(username)
    }
}

/// Whether `password` is non-empty and within the length bound.
pub fn is_valid_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= MAX_PASSWORD_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_valid_email("test1@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "x".repeat(250))));
    }

    #[test]
    fn uuids() {
        assert!(is_valid_uuid("069a79f444e94726a5befca90e38aaf5"));
        assert!(!is_valid_uuid("069a79f4-44e9-4726-a5be-fca90e38aaf5"));
        assert!(!is_valid_uuid("069A79F444E94726A5BEFCA90E38AAF5"));
        assert!(!is_valid_uuid("short"));
    }

    #[test]
    fn player_names() {
        assert!(is_valid_player_name("Tester"));
        assert!(is_valid_player_name("a_b"));
        assert!(!is_valid_player_name("ab"));
        assert!(!is_valid_player_name("this_name_is_way_too_long"));
        assert!(!is_valid_player_name("bad name"));
    }

    #[test]
    fn login_shape_respects_feature_flag() {
        assert!(is_valid_login("test1@example.com", false));
        assert!(!is_valid_login("Tester", false));
        assert!(is_valid_login("Tester", true));
        assert!(!is_valid_login("not an email@", true));
    }
}
