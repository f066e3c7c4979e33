use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a presented API key against the configured one.
///
/// With no key configured every request is allowed.
pub fn is_authorized(provided: Option<&str>, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => provided.is_some_and(|key| constant_time_compare(key, expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret123", "secret123"));
        assert!(!constant_time_compare("secret123", "secret124"));
        assert!(!constant_time_compare("secret123", "secret12"));
        assert!(!constant_time_compare("", "secret"));
    }

    #[test]
    fn test_no_key_configured_allows_all() {
        assert!(is_authorized(None, None));
        assert!(is_authorized(Some("anything"), None));
    }

    #[test]
    fn test_key_required_when_configured() {
        assert!(is_authorized(Some("k3y"), Some("k3y")));
        assert!(!is_authorized(Some("wrong"), Some("k3y")));
        assert!(!is_authorized(None, Some("k3y")));
    }
}
