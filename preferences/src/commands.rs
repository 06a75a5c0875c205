//! Commands exposed by the `pomodoro-prefs` binary
//!
//! - `path`: print the location of the preferences file
//! - `list`: print the whole preferences document
//! - `get <key>`: print one value
//! - `set <key> <value>`: write one value (JSON, or a plain string)
//! - `reset`: write the default for every known key
//! - `migrate`: add shortcut actions missing from the stored document
//!
//! Writes notify `preference-changed` subscribers on the event bus.

use crate::app::AppState;
use crate::config::PREFERENCE_CHANGED_TOPIC;
use crate::error::{AppError, Result};
use crate::services::{PreferenceKey, Preferences};
use serde_json::{json, Value};
use std::io::Write;

pub const USAGE: &str = "\
Usage: pomodoro-prefs <command>

Commands:
  path               Print the preferences file location
  list               Print all preferences
  get <key>          Print one preference
  set <key> <value>  Set one preference (JSON value, or a plain string)
  reset              Restore every preference to its default
  migrate            Add missing global shortcut actions
  help               Show this message";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Path,
    List,
    Get { key: String },
    Set { key: String, value: Value },
    Reset,
    Migrate,
}

impl Command {
    /// Parse command-line arguments, excluding the program name
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Ok(Command::Help),
            ["path"] => Ok(Command::Path),
            ["list"] => Ok(Command::List),
            ["get", key] => Ok(Command::Get {
                key: key.to_string(),
            }),
            ["set", key, raw] => Ok(Command::Set {
                key: key.to_string(),
                value: parse_value(raw),
            }),
            ["reset"] => Ok(Command::Reset),
            ["migrate"] => Ok(Command::Migrate),
            [name, ..] => Err(AppError::Usage(format!(
                "unknown command or wrong arguments: {}",
                name
            ))),
        }
    }
}

/// JSON when it parses, otherwise the raw text as a string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run `command` against `state`, writing output to `out`
pub fn execute(command: &Command, state: &AppState, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Help => {
            writeln!(out, "{}", USAGE)?;
        }
        Command::Path => {
            writeln!(out, "{}", state.store.lock().location().display())?;
        }
        Command::List => {
            let store = state.store.lock();
            writeln!(out, "{}", serde_json::to_string_pretty(store.document())?)?;
        }
        Command::Get { key } => {
            let store = state.store.lock();
            let value = store
                .get(key)
                .ok_or_else(|| AppError::Usage(format!("preference '{}' is not set", key)))?;
            writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        }
        Command::Set { key, value } => {
            if key.parse::<PreferenceKey>().is_err() {
                tracing::warn!("Setting {}, which is not a known preference", key);
            }

            state.store.lock().set(key, value.clone())?;
            tracing::info!("Preference {} updated", key);

            notify_changed(state, key, value.clone());
        }
        Command::Reset => {
            let defaults = Preferences::default();
            state.store.lock().update(&defaults)?;
            tracing::info!("Preferences reset to defaults");

            if let Value::Object(entries) = defaults.to_document() {
                for (key, value) in entries {
                    notify_changed(state, &key, value);
                }
            }
        }
        Command::Migrate => {
            let (added, shortcuts) = {
                let mut store = state.store.lock();
                let added = store.migrate_shortcuts()?;
                (added, store.get(PreferenceKey::GlobalShortcuts).cloned())
            };

            if added.is_empty() {
                writeln!(out, "Global shortcuts are up to date")?;
            } else {
                writeln!(out, "Added shortcuts: {}", added.join(", "))?;
                if let Some(shortcuts) = shortcuts {
                    notify_changed(state, PreferenceKey::GlobalShortcuts.as_str(), shortcuts);
                }
            }
        }
    }

    Ok(())
}

fn notify_changed(state: &AppState, key: &str, value: Value) {
    state.events.emit(
        PREFERENCE_CHANGED_TOPIC,
        &json!({ "key": key, "value": value }),
    );
}
