//! Pre-flight checks on user-supplied identifiers.
//!
//! All checks are pure and run before any request leaves the process; a
//! rejection short-circuits the tool call.

use regex::Regex;
use std::sync::LazyLock;

static FILESPACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*[A-Za-z0-9]$").expect("valid regex"));

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("valid regex"));

const GROUP_NAME_FORBIDDEN: &[char] = &['<', '>', '"', '/', '\\', '|', '?', '*'];

/// Result of validating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The value to send, possibly normalized.
    Ok(String),
    /// Human-readable reason the value was refused.
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Ok(_))
    }

    pub fn into_result(self) -> Result<String, String> {
        match self {
            ValidationOutcome::Ok(value) => Ok(value),
            ValidationOutcome::Rejected(reason) => Err(reason),
        }
    }
}

/// Filespace names: 3-63 characters of letters, digits, `-` and `_`, starting
/// and ending with a letter or digit. Accepted names are returned unchanged.
pub fn validate_filespace_name(name: &str) -> ValidationOutcome {
    if name.is_empty() {
        return ValidationOutcome::Rejected("Filespace name cannot be empty".to_string());
    }

    if !FILESPACE_NAME.is_match(name) {
        return ValidationOutcome::Rejected(
            "Filespace names can only contain letters, numbers, hyphens, and underscores (cannot start/end with special characters)"
                .to_string(),
        );
    }

    let len = name.chars().count();
    if !(3..=63).contains(&len) {
        return ValidationOutcome::Rejected("Filespace names must be 3-63 characters long".to_string());
    }

    ValidationOutcome::Ok(name.to_string())
}

/// Simplified ASCII address check.
pub fn validate_email(email: &str) -> ValidationOutcome {
    if email.is_empty() {
        return ValidationOutcome::Rejected("Email cannot be empty".to_string());
    }

    if !EMAIL.is_match(email) {
        return ValidationOutcome::Rejected("Invalid email address format".to_string());
    }

    ValidationOutcome::Ok(email.to_string())
}

/// Group names: 1-255 characters; characters from `<>"/\|?*` are stripped.
pub fn validate_group_name(name: &str) -> ValidationOutcome {
    if name.is_empty() {
        return ValidationOutcome::Rejected("Group name cannot be empty".to_string());
    }

    if name.chars().count() > 255 {
        return ValidationOutcome::Rejected("Group names must be 1-255 characters long".to_string());
    }

    let clean: String = name
        .chars()
        .filter(|c| !GROUP_NAME_FORBIDDEN.contains(c))
        .collect();

    ValidationOutcome::Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filespace_name_accepted_unchanged() {
        for name in ["abc", "project-alpha", "My_Files_2024", "a1b"] {
            assert_eq!(validate_filespace_name(name), ValidationOutcome::Ok(name.to_string()));
        }
    }

    #[test]
    fn test_filespace_name_rejections() {
        assert_eq!(
            validate_filespace_name(""),
            ValidationOutcome::Rejected("Filespace name cannot be empty".to_string())
        );
        assert!(!validate_filespace_name("-leading").is_ok());
        assert!(!validate_filespace_name("trailing_").is_ok());
        assert!(!validate_filespace_name("has space").is_ok());
        assert!(!validate_filespace_name("a").is_ok());

        // Two characters pass the pattern but not the length rule.
        assert_eq!(
            validate_filespace_name("ab"),
            ValidationOutcome::Rejected("Filespace names must be 3-63 characters long".to_string())
        );

        let long = "a".repeat(64);
        assert!(!validate_filespace_name(&long).is_ok());
        assert!(validate_filespace_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_email() {
        assert_eq!(
            validate_email("bad@"),
            ValidationOutcome::Rejected("Invalid email address format".to_string())
        );
        assert_eq!(validate_email("a@b.com"), ValidationOutcome::Ok("a@b.com".to_string()));
        assert_eq!(
            validate_email(""),
            ValidationOutcome::Rejected("Email cannot be empty".to_string())
        );
        assert!(!validate_email("no-at-sign.com").is_ok());
        assert!(!validate_email("a b@c.com").is_ok());
        assert!(!validate_email("a@b.c").is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn test_group_name_strips_forbidden_characters() {
        assert_eq!(
            validate_group_name(r#"Mark<e>t"i/n\g|?*"#),
            ValidationOutcome::Ok("Marketing".to_string())
        );
        assert_eq!(
            validate_group_name("Design Team"),
            ValidationOutcome::Ok("Design Team".to_string())
        );
    }

    #[test]
    fn test_group_name_length() {
        assert!(!validate_group_name("").is_ok());
        assert!(validate_group_name(&"g".repeat(255)).is_ok());
        assert_eq!(
            validate_group_name(&"g".repeat(256)),
            ValidationOutcome::Rejected("Group names must be 1-255 characters long".to_string())
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(validate_email("a@b.com").into_result(), Ok("a@b.com".to_string()));
        assert!(validate_email("bad@").into_result().is_err());
    }
}
