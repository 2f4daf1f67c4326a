// ABOUTME: Configuration and environment variable management for tagkit
// ABOUTME: Exposes variable names and typed readers for boolean and numeric flags

pub mod constants;

use std::env;

use tracing::warn;

/// Read a boolean flag from the environment.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` (case-insensitive). Unset or empty
/// variables yield `None`; anything else is logged and ignored.
pub fn env_bool(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    match parse_bool(value) {
        Some(flag) => Some(flag),
        None => {
            warn!("Ignoring invalid boolean value for {}: {:?}", name, raw);
            None
        }
    }
}

/// Read a non-empty string from the environment.
pub fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a positive integer from the environment, ignoring values outside `min..=max`.
pub fn env_u32_in_range(name: &str, min: u32, max: u32) -> Option<u32> {
    let raw = env_string(name)?;
    match raw.parse::<u32>() {
        Ok(v) if (min..=max).contains(&v) => Some(v),
        _ => {
            warn!(
                "Ignoring {}={:?}: expected an integer between {} and {}",
                name, raw, min, max
            );
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("Off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_env_readers_ignore_unset_variables() {
        assert_eq!(env_bool("TAGKIT_TEST_SURELY_UNSET_FLAG"), None);
        assert_eq!(env_string("TAGKIT_TEST_SURELY_UNSET_FLAG"), None);
        assert_eq!(env_u32_in_range("TAGKIT_TEST_SURELY_UNSET_FLAG", 1, 10), None);
    }
}
