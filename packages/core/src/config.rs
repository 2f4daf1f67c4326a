// ABOUTME: Tagging configuration shared by storage and service layers
// ABOUTME: Pluggable normalizer/formatter strategies plus lifecycle flags loaded from the environment

use tagkit_config::constants::{
    TAGGING_DELETE_UNUSED_TAGS, TAGGING_LOCALE, TAGGING_UNTAG_ON_DELETE,
};
use tagkit_config::{env_bool, env_string};
use tracing::debug;

use crate::normalize::{slug, title_case};

/// Turns a raw tag or group name into its slug
pub type Normalizer = fn(&str) -> String;

/// Turns a raw tag name into the name stored for display
pub type Formatter = fn(&str) -> String;

/// Settings for a tagging service instance
#[derive(Debug, Clone)]
pub struct TaggingConfig {
    pub normalizer: Normalizer,
    pub display_formatter: Formatter,
    /// Remove an entity's join rows before the entity itself is deleted
    pub untag_on_delete: bool,
    /// Delete tags left without join rows after an untag (suggested tags are kept)
    pub delete_unused_tags: bool,
    /// Locale used for translation-aware lookups and display
    pub locale: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            normalizer: slug,
            display_formatter: title_case,
            untag_on_delete: true,
            delete_unused_tags: false,
            locale: None,
        }
    }
}

impl TaggingConfig {
    /// Defaults overlaid with `TAGGING_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(flag) = env_bool(TAGGING_UNTAG_ON_DELETE) {
            config.untag_on_delete = flag;
        }
        if let Some(flag) = env_bool(TAGGING_DELETE_UNUSED_TAGS) {
            config.delete_unused_tags = flag;
        }
        if let Some(locale) = env_string(TAGGING_LOCALE) {
            config.locale = Some(locale);
        }

        debug!(
            "Loaded tagging config (untag_on_delete: {}, delete_unused_tags: {}, locale: {:?})",
            config.untag_on_delete, config.delete_unused_tags, config.locale
        );

        config
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_display_formatter(mut self, formatter: Formatter) -> Self {
        self.display_formatter = formatter;
        self
    }

    pub fn with_untag_on_delete(mut self, enabled: bool) -> Self {
        self.untag_on_delete = enabled;
        self
    }

    pub fn with_delete_unused_tags(mut self, enabled: bool) -> Self {
        self.delete_unused_tags = enabled;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Slug for `name` under the configured normalizer
    pub fn normalize(&self, name: &str) -> String {
        (self.normalizer)(name.trim())
    }

    /// Display name for `name` under the configured formatter
    pub fn display(&self, name: &str) -> String {
        (self.display_formatter)(name.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(name: &str) -> String {
        name.to_uppercase()
    }

    #[test]
    fn test_defaults() {
        let config = TaggingConfig::default();
        assert!(config.untag_on_delete);
        assert!(!config.delete_unused_tags);
        assert!(config.locale.is_none());
        assert_eq!(config.normalize("  Food Truck "), "food-truck");
        assert_eq!(config.display("food truck"), "Food Truck");
    }

    #[test]
    fn test_custom_strategies() {
        let config = TaggingConfig::default()
            .with_normalizer(upper)
            .with_display_formatter(upper)
            .with_delete_unused_tags(true)
            .with_untag_on_delete(false)
            .with_locale("fr");

        assert_eq!(config.normalize("abc"), "ABC");
        assert_eq!(config.display("abc"), "ABC");
        assert!(config.delete_unused_tags);
        assert!(!config.untag_on_delete);
        assert_eq!(config.locale.as_deref(), Some("fr"));
    }
}
