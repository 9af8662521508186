use url::Url;

use crate::models::UrlRecord;

pub const MIN_VALIDITY_MINUTES: i64 = 1;
/// One week.
pub const MAX_VALIDITY_MINUTES: i64 = 10_080;

/// `true` if `s` parses as an absolute URL with a scheme.
///
/// Any scheme is accepted (`ftp://x` passes); relative references and free
/// text do not.
pub fn is_valid_url(s: &str) -> bool {
    Url::parse(s).is_ok()
}

/// `true` if `s` is non-empty and made only of ASCII letters and digits.
pub fn is_valid_shortcode(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `true` if no record in `existing` already uses `code`.
pub fn is_unique(code: &str, existing: &[UrlRecord]) -> bool {
    !existing.iter().any(|r| r.shortcode == code)
}

pub fn is_valid_validity(minutes: i64) -> bool {
    (MIN_VALIDITY_MINUTES..=MAX_VALIDITY_MINUTES).contains(&minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_urls() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(is_valid_url("http://localhost:3000"));
        assert!(is_valid_url("ftp://x"));
        assert!(is_valid_url("mailto:someone@example.com"));

        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_shortcodes() {
        assert!(is_valid_shortcode("ab12"));
        assert!(is_valid_shortcode("ABCxyz019"));

        assert!(!is_valid_shortcode("ab-12"));
        assert!(!is_valid_shortcode("ab_12"));
        assert!(!is_valid_shortcode("ab 12"));
        assert!(!is_valid_shortcode(""));
        assert!(!is_valid_shortcode("café"));
    }

    #[test]
    fn test_uniqueness() {
        let now = Utc::now();
        let existing = vec![UrlRecord {
            id: 1,
            long_url: "https://example.com".into(),
            shortcode: "abc123".into(),
            short_url: String::new(),
            created_at: now,
            expires_at: now,
            validity_minutes: 1,
            clicks: 0,
            click_details: Vec::new(),
        }];

        assert!(!is_unique("abc123", &existing));
        assert!(is_unique("ABC123", &existing));
        assert!(is_unique("abc123", &[]));
    }

    #[test]
    fn test_validity_bounds() {
        assert!(is_valid_validity(1));
        assert!(is_valid_validity(30));
        assert!(is_valid_validity(10_080));
        assert!(!is_valid_validity(0));
        assert!(!is_valid_validity(-5));
        assert!(!is_valid_validity(10_081));
    }
}
