//! Value validators backing the built-in rule kinds.
//!
//! These mirror what a browser-side form script checks: deliberately loose
//! formats, not RFC-grade parsers.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-+()]+$").expect("phone regex"));

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://\S+$").expect("url regex"));

/// Non-empty after trimming
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `local@domain.tld` with no whitespace and a single `@` per side
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Digits, spaces, dashes, plus signs and parentheses only
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// `http://` or `https://` followed by at least one non-space character
pub fn is_valid_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

/// Length as the browser reports it for `minlength`/`maxlength`.
///
/// Counts UTF-16 code units, so a character outside the BMP counts twice.
pub fn input_length(value: &str) -> usize {
    value.encode_utf16().count()
}

pub fn meets_min_length(value: &str, min: usize) -> bool {
    input_length(value) >= min
}

pub fn meets_max_length(value: &str, max: usize) -> bool {
    input_length(value) <= max
}

/// Unanchored search, the way `RegExp.prototype.test` behaves
pub fn matches_pattern(value: &str, pattern: &Regex) -> bool {
    pattern.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.co.uk"));
        assert!(is_valid_email("user+tag@example.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+886 (02) 1234-5678"));
        assert!(is_valid_phone("0912345678"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://localhost:8080/path?q=1"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("https://exa mple.com"));
    }

    #[test]
    fn test_length_counts_utf16_units() {
        assert_eq!(input_length("hello"), 5);
        assert_eq!(input_length("你好"), 2);
        assert_eq!(input_length("😀"), 2);

        assert!(meets_min_length("你好", 2));
        assert!(!meets_min_length("你", 2));
        assert!(meets_max_length("abc", 3));
        assert!(!meets_max_length("abcd", 3));
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let digits = Regex::new(r"\d{3}").unwrap();
        assert!(matches_pattern("abc123def", &digits));
        assert!(!matches_pattern("ab12", &digits));
    }
}
