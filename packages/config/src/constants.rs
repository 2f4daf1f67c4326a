// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names read by tagkit

// Lifecycle behaviour
pub const TAGGING_UNTAG_ON_DELETE: &str = "TAGGING_UNTAG_ON_DELETE";
pub const TAGGING_DELETE_UNUSED_TAGS: &str = "TAGGING_DELETE_UNUSED_TAGS";

// Translations
pub const TAGGING_LOCALE: &str = "TAGGING_LOCALE";

// Database
pub const TAGGING_DATABASE_URL: &str = "TAGGING_DATABASE_URL";
pub const TAGGING_MAX_CONNECTIONS: &str = "TAGGING_MAX_CONNECTIONS";

// Events
pub const TAGGING_EVENT_CHANNEL_SIZE: &str = "TAGGING_EVENT_CHANNEL_SIZE";
