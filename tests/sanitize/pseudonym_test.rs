//! Identity pseudonymization tests.

use healthchat::sanitize::{Sanitizer, ANONYMOUS_TOKEN};

fn with_salt(salt: &str) -> Sanitizer {
    Sanitizer::new(Some(salt.to_owned())).expect("salt is set")
}

#[test]
fn same_identity_same_salt_is_deterministic() {
    let s = with_salt("salt-a");
    assert_eq!(s.pseudonymize("user@example.com"), s.pseudonymize("user@example.com"));
}

#[test]
fn different_salt_changes_the_token() {
    let a = with_salt("salt-a").pseudonymize("user@example.com");
    let b = with_salt("salt-b").pseudonymize("user@example.com");
    assert_ne!(a, b);
}

#[test]
fn different_identities_get_different_tokens() {
    let s = with_salt("salt-a");
    assert_ne!(s.pseudonymize("alice"), s.pseudonymize("bob"));
}

#[test]
fn token_is_fixed_length_and_opaque() {
    let s = with_salt("salt-a");
    for identity in ["a", "a-much-longer-identity-string", "日本語ユーザー"] {
        let token = s.pseudonymize(identity);
        let digest = token.strip_prefix("user_").expect("token has prefix");
        assert_eq!(digest.len(), 12);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!token.contains(identity));
    }
}

#[test]
fn empty_identity_is_the_reserved_constant() {
    assert_eq!(with_salt("salt-a").pseudonymize(""), ANONYMOUS_TOKEN);
}

#[test]
fn missing_salt_refuses_to_construct() {
    assert!(Sanitizer::new(None).is_err());
}
