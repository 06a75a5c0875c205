//! Preferences schema
//!
//! Typed view of the user-preferences document and the defaults every
//! new document starts from. The stored document itself stays an open JSON
//! object; this module only describes the keys the application knows about.

use crate::config::{
    MAX_DURATION_MINUTES, MAX_HOTKEY_LENGTH, MAX_VOLUME, MAX_WORK_ROUNDS, MIN_DURATION_MINUTES,
    MIN_WORK_ROUNDS,
};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Shortcut action that starts or pauses the timer
pub const ACTION_TIMER_TOGGLE: &str = "call-timer-toggle";
/// Shortcut action that resets the current round
pub const ACTION_TIMER_RESET: &str = "call-timer-reset";
/// Shortcut action that skips to the next round
pub const ACTION_TIMER_SKIP: &str = "call-timer-skip";

/// Keys of the preferences document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    AlwaysOnTop,
    BreakAlwaysOnTop,
    AutoStartWorkTimer,
    AutoStartBreakTimer,
    MinToTray,
    MinToTrayOnClose,
    Notifications,
    WorkRounds,
    Theme,
    TickSounds,
    TickSoundsDuringBreak,
    TimeLongBreak,
    TimeShortBreak,
    TimeWork,
    Volume,
    GlobalShortcuts,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 16] = [
        PreferenceKey::AlwaysOnTop,
        PreferenceKey::BreakAlwaysOnTop,
        PreferenceKey::AutoStartWorkTimer,
        PreferenceKey::AutoStartBreakTimer,
        PreferenceKey::MinToTray,
        PreferenceKey::MinToTrayOnClose,
        PreferenceKey::Notifications,
        PreferenceKey::WorkRounds,
        PreferenceKey::Theme,
        PreferenceKey::TickSounds,
        PreferenceKey::TickSoundsDuringBreak,
        PreferenceKey::TimeLongBreak,
        PreferenceKey::TimeShortBreak,
        PreferenceKey::TimeWork,
        PreferenceKey::Volume,
        PreferenceKey::GlobalShortcuts,
    ];

    /// Name of the key as stored in the JSON document
    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::AlwaysOnTop => "alwaysOnTop",
            PreferenceKey::BreakAlwaysOnTop => "breakAlwaysOnTop",
            PreferenceKey::AutoStartWorkTimer => "autoStartWorkTimer",
            PreferenceKey::AutoStartBreakTimer => "autoStartBreakTimer",
            PreferenceKey::MinToTray => "minToTray",
            PreferenceKey::MinToTrayOnClose => "minToTrayOnClose",
            PreferenceKey::Notifications => "notifications",
            PreferenceKey::WorkRounds => "workRounds",
            PreferenceKey::Theme => "theme",
            PreferenceKey::TickSounds => "tickSounds",
            PreferenceKey::TickSoundsDuringBreak => "tickSoundsDuringBreak",
            PreferenceKey::TimeLongBreak => "timeLongBreak",
            PreferenceKey::TimeShortBreak => "timeShortBreak",
            PreferenceKey::TimeWork => "timeWork",
            PreferenceKey::Volume => "volume",
            PreferenceKey::GlobalShortcuts => "globalShortcuts",
        }
    }
}

impl AsRef<str> for PreferenceKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        PreferenceKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AppError::InvalidPreference(format!("unknown preference key: {}", s)))
    }
}

/// Global shortcut bindings (action -> key combo).
///
/// The set of actions is fixed. Documents written before an action existed
/// need [`crate::services::PreferencesStore::migrate_shortcuts`] to gain it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalShortcuts {
    #[serde(rename = "call-timer-toggle", default = "default_timer_toggle")]
    pub timer_toggle: String,
    #[serde(rename = "call-timer-reset", default = "default_timer_reset")]
    pub timer_reset: String,
    #[serde(rename = "call-timer-skip", default = "default_timer_skip")]
    pub timer_skip: String,
}

fn default_timer_toggle() -> String {
    "Control+F1".to_string()
}

fn default_timer_reset() -> String {
    "Control+F2".to_string()
}

fn default_timer_skip() -> String {
    "Control+F3".to_string()
}

impl Default for GlobalShortcuts {
    fn default() -> Self {
        Self {
            timer_toggle: default_timer_toggle(),
            timer_reset: default_timer_reset(),
            timer_skip: default_timer_skip(),
        }
    }
}

impl GlobalShortcuts {
    /// (action, key combo) pairs in a fixed order
    pub fn bindings(&self) -> [(&'static str, &str); 3] {
        [
            (ACTION_TIMER_TOGGLE, self.timer_toggle.as_str()),
            (ACTION_TIMER_RESET, self.timer_reset.as_str()),
            (ACTION_TIMER_SKIP, self.timer_skip.as_str()),
        ]
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .bindings()
            .into_iter()
            .map(|(action, combo)| (action.to_string(), Value::from(combo)))
            .collect();
        Value::Object(map)
    }
}

/// User preferences, one field per document key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub always_on_top: bool,
    pub break_always_on_top: bool,
    pub auto_start_work_timer: bool,
    pub auto_start_break_timer: bool,
    pub min_to_tray: bool,
    pub min_to_tray_on_close: bool,
    pub notifications: bool,
    pub work_rounds: u32,
    /// Theme name, `None` means the built-in theme
    pub theme: Option<String>,
    pub tick_sounds: bool,
    pub tick_sounds_during_break: bool,
    /// Minutes
    pub time_long_break: u32,
    /// Minutes
    pub time_short_break: u32,
    /// Minutes
    pub time_work: u32,
    /// Percentage, 0-100
    pub volume: u32,
    pub global_shortcuts: GlobalShortcuts,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            always_on_top: false,
            break_always_on_top: false,
            auto_start_work_timer: true,
            auto_start_break_timer: true,
            min_to_tray: false,
            min_to_tray_on_close: false,
            notifications: true,
            work_rounds: 4,
            theme: None,
            tick_sounds: false,
            tick_sounds_during_break: true,
            time_long_break: 15,
            time_short_break: 5,
            time_work: 25,
            volume: 100,
            global_shortcuts: GlobalShortcuts::default(),
        }
    }
}

impl Preferences {
    /// Build a typed view of a stored document.
    ///
    /// Keys that are missing or hold a value of the wrong type read as their
    /// default. The document is not modified.
    pub fn from_document(doc: &Value) -> Self {
        let defaults = Self::default();
        Self {
            always_on_top: field(doc, PreferenceKey::AlwaysOnTop, defaults.always_on_top),
            break_always_on_top: field(
                doc,
                PreferenceKey::BreakAlwaysOnTop,
                defaults.break_always_on_top,
            ),
            auto_start_work_timer: field(
                doc,
                PreferenceKey::AutoStartWorkTimer,
                defaults.auto_start_work_timer,
            ),
            auto_start_break_timer: field(
                doc,
                PreferenceKey::AutoStartBreakTimer,
                defaults.auto_start_break_timer,
            ),
            min_to_tray: field(doc, PreferenceKey::MinToTray, defaults.min_to_tray),
            min_to_tray_on_close: field(
                doc,
                PreferenceKey::MinToTrayOnClose,
                defaults.min_to_tray_on_close,
            ),
            notifications: field(doc, PreferenceKey::Notifications, defaults.notifications),
            work_rounds: field(doc, PreferenceKey::WorkRounds, defaults.work_rounds),
            theme: field(doc, PreferenceKey::Theme, defaults.theme),
            tick_sounds: field(doc, PreferenceKey::TickSounds, defaults.tick_sounds),
            tick_sounds_during_break: field(
                doc,
                PreferenceKey::TickSoundsDuringBreak,
                defaults.tick_sounds_during_break,
            ),
            time_long_break: field(doc, PreferenceKey::TimeLongBreak, defaults.time_long_break),
            time_short_break: field(
                doc,
                PreferenceKey::TimeShortBreak,
                defaults.time_short_break,
            ),
            time_work: field(doc, PreferenceKey::TimeWork, defaults.time_work),
            volume: field(doc, PreferenceKey::Volume, defaults.volume),
            global_shortcuts: field(
                doc,
                PreferenceKey::GlobalShortcuts,
                defaults.global_shortcuts,
            ),
        }
    }

    /// The preferences as a JSON object holding every schema key
    pub fn to_document(&self) -> Value {
        let entries: [(PreferenceKey, Value); 16] = [
            (PreferenceKey::AlwaysOnTop, self.always_on_top.into()),
            (PreferenceKey::BreakAlwaysOnTop, self.break_always_on_top.into()),
            (PreferenceKey::AutoStartWorkTimer, self.auto_start_work_timer.into()),
            (PreferenceKey::AutoStartBreakTimer, self.auto_start_break_timer.into()),
            (PreferenceKey::MinToTray, self.min_to_tray.into()),
            (PreferenceKey::MinToTrayOnClose, self.min_to_tray_on_close.into()),
            (PreferenceKey::Notifications, self.notifications.into()),
            (PreferenceKey::WorkRounds, self.work_rounds.into()),
            (PreferenceKey::Theme, self.theme.clone().map_or(Value::Null, Value::from)),
            (PreferenceKey::TickSounds, self.tick_sounds.into()),
            (PreferenceKey::TickSoundsDuringBreak, self.tick_sounds_during_break.into()),
            (PreferenceKey::TimeLongBreak, self.time_long_break.into()),
            (PreferenceKey::TimeShortBreak, self.time_short_break.into()),
            (PreferenceKey::TimeWork, self.time_work.into()),
            (PreferenceKey::Volume, self.volume.into()),
            (PreferenceKey::GlobalShortcuts, self.global_shortcuts.to_value()),
        ];

        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect();
        Value::Object(map)
    }

    /// Check values against the limits in [`crate::config`]
    pub fn validate(&self) -> Result<()> {
        if self.volume > MAX_VOLUME {
            return Err(AppError::InvalidPreference(format!(
                "volume must be between 0 and {}, got {}",
                MAX_VOLUME, self.volume
            )));
        }

        if !(MIN_WORK_ROUNDS..=MAX_WORK_ROUNDS).contains(&self.work_rounds) {
            return Err(AppError::InvalidPreference(format!(
                "workRounds must be between {} and {}, got {}",
                MIN_WORK_ROUNDS, MAX_WORK_ROUNDS, self.work_rounds
            )));
        }

        let durations = [
            (PreferenceKey::TimeWork, self.time_work),
            (PreferenceKey::TimeShortBreak, self.time_short_break),
            (PreferenceKey::TimeLongBreak, self.time_long_break),
        ];
        for (key, minutes) in durations {
            if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(AppError::InvalidPreference(format!(
                    "{} must be between {} and {} minutes, got {}",
                    key, MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, minutes
                )));
            }
        }

        for (action, combo) in self.global_shortcuts.bindings() {
            if combo.trim().is_empty() {
                return Err(AppError::InvalidPreference(format!(
                    "shortcut for {} is empty",
                    action
                )));
            }
            if combo.len() > MAX_HOTKEY_LENGTH {
                return Err(AppError::InvalidPreference(format!(
                    "shortcut for {} exceeds {} characters",
                    action, MAX_HOTKEY_LENGTH
                )));
            }
        }

        Ok(())
    }
}

fn field<T: DeserializeOwned>(doc: &Value, key: PreferenceKey, default: T) -> T {
    doc.get(key.as_str())
        .and_then(|value| T::deserialize(value).ok())
        .unwrap_or(default)
}

/// Returns a freshly allocated default preferences document.
///
/// Every call builds a new value, so callers may mutate their copy freely.
pub fn default_document() -> Value {
    Preferences::default().to_document()
}
