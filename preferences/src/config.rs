//! Application configuration constants
//!
//! Central location for file names, environment overrides, event topics
//! and the validation boundaries applied to user preferences.

// ===== Storage =====

/// Logical name of the preferences document (the file gets a `.json` suffix)
pub const PREFERENCES_STORE_NAME: &str = "user-preferences";

/// Extension appended to a store's logical name
pub const PREFERENCES_FILE_EXTENSION: &str = "json";

/// Directory name under the OS config dir that scopes all persisted files
pub const APP_IDENTIFIER: &str = "pomodoro-timer";

/// Environment variable that overrides the application-config root
pub const CONFIG_DIR_ENV: &str = "POMODORO_CONFIG_DIR";

// ===== Event Topics =====

/// Emitted by the command layer after a preference was written
pub const PREFERENCE_CHANGED_TOPIC: &str = "preference-changed";

// ===== Timer Limits =====

/// Minimum number of work rounds before a long break
pub const MIN_WORK_ROUNDS: u32 = 1;
/// Maximum number of work rounds before a long break
pub const MAX_WORK_ROUNDS: u32 = 12;

/// Shortest configurable work or break duration, in minutes
pub const MIN_DURATION_MINUTES: u32 = 1;
/// Longest configurable work or break duration, in minutes
pub const MAX_DURATION_MINUTES: u32 = 90;

// ===== Sound Limits =====

/// Volume is a percentage
pub const MAX_VOLUME: u32 = 100;

// ===== Shortcut Limits =====

/// Maximum length for a key-combo string (e.g., "Control+Shift+F1").
/// Prevents excessively long values from being stored.
pub const MAX_HOTKEY_LENGTH: usize = 50;
