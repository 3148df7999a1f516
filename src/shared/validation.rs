use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose e-mail shape check applied before handing an address to the mail relay
    /// - Valid: "ana@example.com", "first.last+tag@city.gov.it"
    /// - Invalid: "ana", "ana@", "@example.com", "ana@example", "a na@example.com"
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_regex_valid() {
        assert!(EMAIL_REGEX.is_match("ana@example.com"));
        assert!(EMAIL_REGEX.is_match("first.last+tag@city.gov.it"));
    }

    #[test]
    fn test_email_regex_invalid() {
        assert!(!EMAIL_REGEX.is_match("ana"));
        assert!(!EMAIL_REGEX.is_match("ana@"));
        assert!(!EMAIL_REGEX.is_match("@example.com"));
        assert!(!EMAIL_REGEX.is_match("ana@example"));
        assert!(!EMAIL_REGEX.is_match("a na@example.com"));
        assert!(!EMAIL_REGEX.is_match(""));
    }
}
