//! Wildcard mask matching.
//!
//! Autokill masks, session exceptions, nickname access masks and channel
//! auto-kick masks all use `*`/`?` wildcards matched case-insensitively
//! against constructed `user@host` or `nick!user@host` strings.

use regex::Regex;

/// Simple wildcard matching with `*` and `?` support.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// Case-insensitive matching for IRC compatibility.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    // Convert wildcard pattern to regex
    let mut regex_pattern = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => regex_pattern.push_str(".*"),
            '?' => regex_pattern.push('.'),
            // Escape regex special characters
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\' => {
                regex_pattern.push('\\');
                regex_pattern.push(c);
            }
            _ => regex_pattern.push(c),
        }
    }
    regex_pattern.push('$');

    Regex::new(&regex_pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Split a `user@host` mask into its two halves.
///
/// A mask without `@` is treated as a host-only pattern, matching any
/// user part.
pub fn split_user_host(mask: &str) -> (&str, &str) {
    match mask.split_once('@') {
        Some((user, host)) => (user, host),
        None => ("*", mask),
    }
}

/// Normalize an operator-supplied `user@host` mask: missing user part
/// becomes `*`, empty halves are rejected.
pub fn normalize_user_host(mask: &str) -> Option<String> {
    let (user, host) = split_user_host(mask);
    if user.is_empty() || host.is_empty() || host.contains('@') {
        return None;
    }
    Some(format!("{}@{}", user, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matching() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("test*", "testing"));
        assert!(wildcard_match("*test", "unittest"));
        assert!(wildcard_match("*test*", "unittesting"));
        assert!(wildcard_match("te?t", "test"));
        assert!(!wildcard_match("te?t", "tests"));
        assert!(wildcard_match("*@*.example.com", "user@host.example.com"));
    }

    #[test]
    fn test_wildcard_case_insensitive() {
        assert!(wildcard_match("TEST*", "testing"));
        assert!(wildcard_match("*@BADHOST.example", "spam@badhost.EXAMPLE"));
    }

    #[test]
    fn test_split_user_host() {
        assert_eq!(split_user_host("joe@example.com"), ("joe", "example.com"));
        assert_eq!(split_user_host("example.com"), ("*", "example.com"));
    }

    #[test]
    fn test_normalize_user_host() {
        assert_eq!(
            normalize_user_host("badhost.example").as_deref(),
            Some("*@badhost.example")
        );
        assert_eq!(
            normalize_user_host("spam@badhost.example").as_deref(),
            Some("spam@badhost.example")
        );
        assert!(normalize_user_host("@host").is_none());
        assert!(normalize_user_host("a@b@c").is_none());
    }
}
