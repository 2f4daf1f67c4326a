// ABOUTME: Input validation for tag, group, and translation names
// ABOUTME: Rejects empty names, oversized names, and names that normalize to an empty slug

use thiserror::Error;

/// Longest display name accepted for tags and groups
pub const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tag name is required")]
    EmptyTagName,

    #[error("Tag group name is required")]
    EmptyGroupName,

    #[error("Name is too long: {0} characters (max {MAX_NAME_LENGTH})")]
    NameTooLong(usize),

    #[error("Name {0:?} does not produce a usable slug")]
    InvalidSlug(String),

    #[error("Locale is required")]
    EmptyLocale,
}

/// Validate a display name before it is persisted.
///
/// `normalized` is the slug the configured normalizer produced for `name`; an empty
/// slug means nothing addressable would be stored.
pub fn validate_name(
    name: &str,
    normalized: &str,
    empty_error: ValidationError,
) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(empty_error);
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong(length));
    }

    if normalized.is_empty() {
        return Err(ValidationError::InvalidSlug(trimmed.to_string()));
    }

    Ok(())
}

/// Validate a locale identifier such as `en` or `pt-BR`.
pub fn validate_locale(locale: &str) -> Result<(), ValidationError> {
    if locale.trim().is_empty() {
        return Err(ValidationError::EmptyLocale);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Cooking", "cooking", ValidationError::EmptyTagName).is_ok());
        assert_eq!(
            validate_name("   ", "", ValidationError::EmptyTagName),
            Err(ValidationError::EmptyTagName)
        );
        assert_eq!(
            validate_name("", "", ValidationError::EmptyGroupName),
            Err(ValidationError::EmptyGroupName)
        );
        assert_eq!(
            validate_name("!!!", "", ValidationError::EmptyTagName),
            Err(ValidationError::InvalidSlug("!!!".to_string()))
        );
    }

    #[test]
    fn test_validate_name_length() {
        let long = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            validate_name(&long, &long, ValidationError::EmptyTagName),
            Err(ValidationError::NameTooLong(MAX_NAME_LENGTH + 1))
        );
    }

    #[test]
    fn test_validate_locale() {
        assert!(validate_locale("en").is_ok());
        assert_eq!(validate_locale(" "), Err(ValidationError::EmptyLocale));
    }
}
