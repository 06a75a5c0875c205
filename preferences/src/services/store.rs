//! Preferences store
//!
//! Owns the user-preferences document. On construction the document is loaded
//! from the config root, or initialized from defaults when no file exists.
//! Reads are served from memory; every write replaces the whole file.
//!
//! Persistence is best effort: failed writes are logged and returned, but the
//! in-memory document always keeps the change.

use crate::config::{PREFERENCES_FILE_EXTENSION, PREFERENCES_STORE_NAME};
use crate::error::{AppError, Result};
use crate::services::preferences::{default_document, GlobalShortcuts, PreferenceKey, Preferences};
use crate::storage::{ConfigDir, FsConfigDir};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the working document came from
#[derive(Debug)]
pub enum DocumentSource {
    /// No file existed, the defaults were written as the initial file
    Created,
    /// No file existed and writing the defaults failed
    CreateFailed(AppError),
    /// The existing file was read and parsed
    Parsed,
    /// The existing file could not be read or parsed, defaults are in use
    Recovered(AppError),
}

/// Result of [`load_or_initialize`]
#[derive(Debug)]
pub struct Loaded {
    pub document: Value,
    pub source: DocumentSource,
}

/// Determine the working document for `path`.
///
/// A parsed file is returned as-is, even when it lacks schema keys. A file
/// that fails to read or parse is left untouched on disk.
pub fn load_or_initialize(config_dir: &dyn ConfigDir, path: &Path, defaults: Value) -> Loaded {
    if !config_dir.exists(path) {
        tracing::info!("Preferences file not found, creating default preferences");

        let source = match write_document(config_dir, path, &defaults) {
            Ok(()) => DocumentSource::Created,
            Err(e) => {
                tracing::error!("Failed to create {:?}: {}", config_dir.resolve(path), e);
                DocumentSource::CreateFailed(e)
            }
        };

        return Loaded {
            document: defaults,
            source,
        };
    }

    match read_document(config_dir, path) {
        Ok(document) => Loaded {
            document,
            source: DocumentSource::Parsed,
        },
        Err(e) => {
            tracing::error!(
                "Failed to load {:?}, using defaults: {}",
                config_dir.resolve(path),
                e
            );
            Loaded {
                document: defaults,
                source: DocumentSource::Recovered(e),
            }
        }
    }
}

fn read_document(config_dir: &dyn ConfigDir, path: &Path) -> Result<Value> {
    let content = config_dir.read_text(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_document(config_dir: &dyn ConfigDir, path: &Path, document: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    config_dir.write_text(path, &content)
}

/// Key-value preferences persisted as one JSON file
pub struct PreferencesStore {
    path: PathBuf,
    data: Value,
    source: DocumentSource,
    config_dir: Arc<dyn ConfigDir>,
}

impl PreferencesStore {
    /// Open the store `<name>.json`, seeding a missing file with `defaults`
    pub fn open(name: &str, defaults: Value, config_dir: Arc<dyn ConfigDir>) -> Self {
        let path = PathBuf::from(format!("{}.{}", name, PREFERENCES_FILE_EXTENSION));
        let Loaded { document, source } =
            load_or_initialize(config_dir.as_ref(), &path, defaults);

        tracing::info!("Preferences loaded from {:?}", config_dir.resolve(&path));

        Self {
            path,
            data: document,
            source,
            config_dir,
        }
    }

    /// File path relative to the config root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute location of the preferences file
    pub fn location(&self) -> PathBuf {
        self.config_dir.resolve(&self.path)
    }

    /// How the document was obtained when the store was opened
    pub fn load_source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn document(&self) -> &Value {
        &self.data
    }

    /// Current value for `key`, `None` when the key is absent
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&Value> {
        self.data.get(key.as_ref())
    }

    /// Current value for `key` deserialized as `T`, `None` when absent or of another type
    pub fn get_as<T: DeserializeOwned, K: AsRef<str>>(&self, key: K) -> Option<T> {
        self.get(key).and_then(|value| T::deserialize(value).ok())
    }

    /// Typed view with defaults substituted for missing keys
    pub fn preferences(&self) -> Preferences {
        Preferences::from_document(&self.data)
    }

    /// Set `key` to `value` and write the whole document to disk.
    ///
    /// The in-memory value is updated even when the write fails.
    pub fn set<K: AsRef<str>>(&mut self, key: K, value: impl Into<Value>) -> Result<()> {
        let key = key.as_ref().to_string();
        let value = value.into();

        tracing::debug!("Setting preference {} = {}", key, value);
        self.with_object(|map| {
            map.insert(key, value);
        });

        self.persist()
    }

    /// Validate `prefs` and write every schema key from it.
    ///
    /// Keys outside the schema are kept. Nothing changes when validation fails.
    pub fn update(&mut self, prefs: &Preferences) -> Result<()> {
        prefs.validate()?;

        if let Value::Object(entries) = prefs.to_document() {
            self.with_object(|map| map.extend(entries));
        }

        self.persist()
    }

    /// Add default bindings for shortcut actions the stored document lacks.
    ///
    /// Returns the added action names. The file is only rewritten when
    /// something was added.
    pub fn migrate_shortcuts(&mut self) -> Result<Vec<String>> {
        let key = PreferenceKey::GlobalShortcuts.as_str();
        let defaults = GlobalShortcuts::default();

        let added = self.with_object(|map| {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));

            let Some(bindings) = entry.as_object_mut() else {
                return Err(AppError::InvalidPreference(format!(
                    "{} is not an object",
                    key
                )));
            };

            let mut added = Vec::new();
            for (action, combo) in defaults.bindings() {
                if !bindings.contains_key(action) {
                    bindings.insert(action.to_string(), Value::from(combo));
                    added.push(action.to_string());
                }
            }
            Ok(added)
        })?;

        if !added.is_empty() {
            tracing::info!("Migrated global shortcuts, added: {:?}", added);
            self.persist()?;
        }

        Ok(added)
    }

    /// Write the whole in-memory document to disk
    pub fn persist(&self) -> Result<()> {
        write_document(self.config_dir.as_ref(), &self.path, &self.data).map_err(|e| {
            tracing::error!("Failed to save preferences to {:?}: {}", self.location(), e);
            e
        })?;

        tracing::info!("Preferences saved to {:?}", self.location());
        Ok(())
    }

    fn with_object<R>(&mut self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut map = match std::mem::take(&mut self.data) {
            Value::Object(map) => map,
            _ => {
                tracing::warn!("Preferences document is not a JSON object, replacing it");
                Map::new()
            }
        };

        let result = f(&mut map);
        self.data = Value::Object(map);
        result
    }
}

/// Shared handle to the store
pub type StoreHandle = Arc<Mutex<PreferencesStore>>;

/// Creates the preferences store once and hands out the same handle afterwards
pub struct StoreFactory {
    config_dir: Arc<dyn ConfigDir>,
    instance: Mutex<Option<StoreHandle>>,
}

impl StoreFactory {
    pub fn new(config_dir: Arc<dyn ConfigDir>) -> Self {
        Self {
            config_dir,
            instance: Mutex::new(None),
        }
    }

    pub fn config_dir(&self) -> &Arc<dyn ConfigDir> {
        &self.config_dir
    }

    /// Get the store, opening it with a copy of the default document on first use
    pub fn create_store(&self) -> StoreHandle {
        self.create_store_with(default_document())
    }

    /// Get the store, opening it with `seed` on first use.
    ///
    /// Once the store exists `seed` is ignored.
    pub fn create_store_with(&self, seed: Value) -> StoreHandle {
        let mut instance = self.instance.lock();

        if let Some(store) = instance.as_ref() {
            return Arc::clone(store);
        }

        let store = Arc::new(Mutex::new(PreferencesStore::open(
            PREFERENCES_STORE_NAME,
            seed,
            Arc::clone(&self.config_dir),
        )));
        *instance = Some(Arc::clone(&store));

        store
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.lock().is_some()
    }

    /// Forget the current store so the next request opens a new one.
    /// Handles already given out stay valid.
    pub fn reset(&self) {
        self.instance.lock().take();
    }
}

lazy_static! {
    /// Process-wide factory rooted at the application-config directory.
    static ref STORE_FACTORY: StoreFactory =
        StoreFactory::new(Arc::new(FsConfigDir::app_config()));
}

/// The process-wide store factory
pub fn store_factory() -> &'static StoreFactory {
    &STORE_FACTORY
}

/// Get the process-wide preferences store
pub fn create_store() -> StoreHandle {
    STORE_FACTORY.create_store()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use tempfile::TempDir;

    /// Reads from disk, refuses every write
    struct ReadOnlyDir(FsConfigDir);

    impl ConfigDir for ReadOnlyDir {
        fn root(&self) -> &Path {
            self.0.root()
        }

        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }

        fn read_text(&self, path: &Path) -> Result<String> {
            self.0.read_text(path)
        }

        fn write_text(&self, _path: &Path, _contents: &str) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn create_dir(&self, _path: &Path) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    fn create_test_store() -> (PreferencesStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = open_in(&temp_dir);
        (store, temp_dir)
    }

    fn open_in(temp_dir: &TempDir) -> PreferencesStore {
        PreferencesStore::open(
            PREFERENCES_STORE_NAME,
            default_document(),
            Arc::new(FsConfigDir::new(temp_dir.path())),
        )
    }

    fn read_file(temp_dir: &TempDir) -> Value {
        let content =
            std::fs::read_to_string(temp_dir.path().join("user-preferences.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_defaults_written_when_file_missing() {
        let (store, temp) = create_test_store();

        assert!(matches!(store.load_source(), DocumentSource::Created));
        assert_eq!(store.path(), Path::new("user-preferences.json"));
        assert_eq!(store.location(), temp.path().join("user-preferences.json"));

        let defaults = default_document();
        for key in PreferenceKey::ALL {
            assert_eq!(store.get(key), defaults.get(key.as_str()), "key {}", key);
        }
        assert_eq!(read_file(&temp), defaults);
    }

    #[test]
    fn test_existing_file_is_returned_verbatim() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("user-preferences.json"), r#"{"volume": 42}"#).unwrap();

        let store = open_in(&temp);

        assert!(matches!(store.load_source(), DocumentSource::Parsed));
        assert_eq!(store.get("volume"), Some(&json!(42)));
        // No backfilling of missing schema keys
        assert_eq!(store.get("notifications"), None);
        // The typed view still reads defaults
        assert!(store.preferences().notifications);
    }

    #[test]
    fn test_malformed_file_falls_back_and_is_untouched() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("user-preferences.json");
        std::fs::write(&file, "{ volume: 42,").unwrap();

        let store = open_in(&temp);

        assert!(matches!(
            store.load_source(),
            DocumentSource::Recovered(AppError::Serialization(_))
        ));
        assert_eq!(store.document(), &default_document());
        assert_eq!(std::fs::read(&file).unwrap(), b"{ volume: 42,");
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text
        std::fs::create_dir(temp.path().join("user-preferences.json")).unwrap();

        let store = open_in(&temp);

        assert!(matches!(
            store.load_source(),
            DocumentSource::Recovered(AppError::Io(_))
        ));
        assert_eq!(store.get("volume"), Some(&json!(100)));
    }

    #[test]
    fn test_set_persists_full_document() {
        let (mut store, temp) = create_test_store();

        store.set("volume", 77).unwrap();
        assert_eq!(store.get("volume"), Some(&json!(77)));

        let mut expected = default_document();
        expected["volume"] = json!(77);
        assert_eq!(read_file(&temp), expected);

        // A new store sees the persisted value
        let reopened = open_in(&temp);
        assert_eq!(reopened.get_as::<u32, _>(PreferenceKey::Volume), Some(77));
    }

    #[test]
    fn test_set_overwrites_regardless_of_type() {
        let (mut store, temp) = create_test_store();

        store.set(PreferenceKey::TimeWork, "fifty").unwrap();
        store.set("customKey", json!({ "nested": [1, 2] })).unwrap();

        assert_eq!(store.get("timeWork"), Some(&json!("fifty")));
        assert_eq!(store.get_as::<u32, _>("timeWork"), None);
        assert_eq!(store.preferences().time_work, 25);
        assert_eq!(read_file(&temp)["customKey"], json!({ "nested": [1, 2] }));
    }

    #[test]
    fn test_set_keeps_memory_when_write_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("user-preferences.json"), r#"{"volume": 10}"#).unwrap();

        let mut store = PreferencesStore::open(
            PREFERENCES_STORE_NAME,
            default_document(),
            Arc::new(ReadOnlyDir(FsConfigDir::new(temp.path()))),
        );

        let result = store.set("volume", 77);
        assert!(matches!(result, Err(AppError::Io(_))));
        assert_eq!(store.get("volume"), Some(&json!(77)));

        // Disk still has the previous value
        assert_eq!(read_file(&temp), json!({ "volume": 10 }));
    }

    #[test]
    fn test_create_failure_keeps_defaults() {
        let temp = TempDir::new().unwrap();

        let store = PreferencesStore::open(
            PREFERENCES_STORE_NAME,
            default_document(),
            Arc::new(ReadOnlyDir(FsConfigDir::new(temp.path()))),
        );

        assert!(matches!(store.load_source(), DocumentSource::CreateFailed(_)));
        assert_eq!(store.document(), &default_document());
        assert!(!temp.path().join("user-preferences.json").exists());
    }

    #[test]
    fn test_non_object_document() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("user-preferences.json"), "[1, 2, 3]").unwrap();

        let mut store = open_in(&temp);
        assert_eq!(store.document(), &json!([1, 2, 3]));
        assert_eq!(store.get("volume"), None);

        store.set("volume", 50).unwrap();
        assert_eq!(store.document(), &json!({ "volume": 50 }));
        assert_eq!(read_file(&temp), json!({ "volume": 50 }));
    }

    #[test]
    fn test_update_merges_schema_keys() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("user-preferences.json"),
            r#"{"volume": 42, "legacyFlag": true}"#,
        )
        .unwrap();
        let mut store = open_in(&temp);

        let prefs = Preferences {
            theme: Some("nord".to_string()),
            ..store.preferences()
        };
        store.update(&prefs).unwrap();

        let on_disk = read_file(&temp);
        assert_eq!(on_disk["volume"], json!(42));
        assert_eq!(on_disk["theme"], json!("nord"));
        assert_eq!(on_disk["notifications"], json!(true));
        assert_eq!(on_disk["legacyFlag"], json!(true));
        assert_eq!(store.preferences(), prefs);
    }

    #[test]
    fn test_update_rejects_invalid_preferences() {
        let (mut store, temp) = create_test_store();

        let prefs = Preferences {
            volume: 250,
            ..Preferences::default()
        };
        assert!(matches!(
            store.update(&prefs),
            Err(AppError::InvalidPreference(_))
        ));

        assert_eq!(store.get("volume"), Some(&json!(100)));
        assert_eq!(read_file(&temp), default_document());
    }

    #[test]
    fn test_migrate_shortcuts_adds_missing_actions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("user-preferences.json"),
            r#"{"globalShortcuts": {"call-timer-toggle": "Alt+Space"}}"#,
        )
        .unwrap();
        let mut store = open_in(&temp);

        let added = store.migrate_shortcuts().unwrap();
        assert_eq!(added, vec!["call-timer-reset", "call-timer-skip"]);

        let on_disk = read_file(&temp);
        assert_eq!(
            on_disk["globalShortcuts"],
            json!({
                "call-timer-toggle": "Alt+Space",
                "call-timer-reset": "Control+F2",
                "call-timer-skip": "Control+F3"
            })
        );

        // Second run has nothing to do
        assert!(store.migrate_shortcuts().unwrap().is_empty());
    }

    #[test]
    fn test_migrate_shortcuts_without_group() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("user-preferences.json"), r#"{"volume": 5}"#).unwrap();
        let mut store = open_in(&temp);

        assert_eq!(store.migrate_shortcuts().unwrap().len(), 3);
        assert_eq!(
            store.get(PreferenceKey::GlobalShortcuts),
            Some(&GlobalShortcuts::default().to_value())
        );
    }

    #[test]
    fn test_migrate_shortcuts_rejects_non_object_group() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("user-preferences.json"),
            r#"{"globalShortcuts": "Control+F1"}"#,
        )
        .unwrap();
        let mut store = open_in(&temp);

        assert!(store.migrate_shortcuts().is_err());
        assert_eq!(store.get("globalShortcuts"), Some(&json!("Control+F1")));
    }

    #[test]
    fn test_factory_returns_same_store() {
        let temp = TempDir::new().unwrap();
        let factory = StoreFactory::new(Arc::new(FsConfigDir::new(temp.path())));
        assert!(!factory.is_initialized());

        let first = factory.create_store();
        let second = factory.create_store_with(json!({ "volume": 1 }));

        assert!(Arc::ptr_eq(&first, &second));
        // The later seed is ignored
        assert_eq!(second.lock().get("volume"), Some(&json!(100)));
    }

    #[test]
    fn test_factory_seed_is_a_copy() {
        let temp = TempDir::new().unwrap();
        let factory = StoreFactory::new(Arc::new(FsConfigDir::new(temp.path())));

        let store = factory.create_store();
        store.lock().set("volume", 3).unwrap();

        assert_eq!(default_document()["volume"], json!(100));
    }

    #[test]
    fn test_factory_reset() {
        let temp = TempDir::new().unwrap();
        let factory = StoreFactory::new(Arc::new(FsConfigDir::new(temp.path())));

        let first = factory.create_store();
        first.lock().set("volume", 60).unwrap();

        factory.reset();
        assert!(!factory.is_initialized());

        let second = factory.create_store();
        assert!(!Arc::ptr_eq(&first, &second));
        // The new store reads what the old one persisted
        assert_eq!(second.lock().get("volume"), Some(&json!(60)));
        assert!(matches!(second.lock().load_source(), DocumentSource::Parsed));
    }
}
