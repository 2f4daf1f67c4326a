// ABOUTME: Core types, traits, and utilities for tagkit
// ABOUTME: Slug normalization, display formatting, configuration, and validation shared by all packages

pub mod config;
pub mod normalize;
pub mod validation;

// Re-export configuration
pub use config::{Formatter, Normalizer, TaggingConfig};

// Re-export normalization helpers
pub use normalize::{is_valid_slug, parse_tag_list, slug, title_case, SLUG_SEPARATOR};

// Re-export validation
pub use validation::{validate_locale, validate_name, ValidationError};
