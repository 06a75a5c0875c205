//! Application-config directory access
//!
//! Every persisted file of the preferences subsystem lives under one
//! application-config root. Paths handed to a [`ConfigDir`] are relative
//! to that root.
//!
//! Example: with root "~/.config/pomodoro-timer", the path
//! "user-preferences.json" resolves to "~/.config/pomodoro-timer/user-preferences.json"

use crate::config::{APP_IDENTIFIER, CONFIG_DIR_ENV};
use crate::error::{AppError, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File operations scoped to the application-config root
pub trait ConfigDir: Send + Sync {
    /// The root every relative path is resolved against
    fn root(&self) -> &Path;

    /// Absolute location of a root-relative path
    fn resolve(&self, path: &Path) -> PathBuf {
        self.root().join(path)
    }

    fn exists(&self, path: &Path) -> bool;

    fn read_text(&self, path: &Path) -> Result<String>;

    /// Create or fully replace the file at `path`
    fn write_text(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create the directory at `path`, including missing parents
    fn create_dir(&self, path: &Path) -> Result<()>;
}

/// [`ConfigDir`] backed by the local filesystem
#[derive(Debug, Clone)]
pub struct FsConfigDir {
    root: PathBuf,
}

impl FsConfigDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Provider rooted at [`user_dir`]
    pub fn app_config() -> Self {
        Self::new(user_dir())
    }
}

impl ConfigDir for FsConfigDir {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(self.resolve(path))?)
    }

    fn write_text(&self, path: &Path, contents: &str) -> Result<()> {
        let target = self.resolve(path);

        // Write to temp file first, then rename over the target
        let temp_path = target.with_extension("tmp");

        if let Err(e) = write_synced(&temp_path, contents.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &target))
        {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        tracing::debug!("Wrote {:?} ({} bytes)", target, contents.len());

        Ok(())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(self.resolve(path))?;
        Ok(())
    }
}

/// Write `data` to a new file at `path` and flush it to disk
fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Resolve the application-config root.
///
/// `POMODORO_CONFIG_DIR` wins when set and non-empty, otherwise the OS config
/// directory joined with the application identifier.
pub fn try_config_root() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_IDENTIFIER))
        .ok_or(AppError::ConfigDirUnavailable)
}

/// Get the application-config root in the current environment
pub fn user_dir() -> PathBuf {
    try_config_root().unwrap_or_else(|e| {
        tracing::warn!("{}, falling back to ./{}", e, APP_IDENTIFIER);
        PathBuf::from(APP_IDENTIFIER)
    })
}

/// Create a directory under the config root if it doesn't exist.
///
/// Failures are logged before being returned; callers that only want
/// best-effort creation can drop the result.
pub fn init_directory(config_dir: &dyn ConfigDir, path: &Path) -> Result<()> {
    if config_dir.exists(path) {
        return Ok(());
    }

    tracing::info!("Creating directory: {:?}", config_dir.resolve(path));

    config_dir.create_dir(path).map_err(|e| {
        tracing::error!("Failed to create directory {:?}: {}", path, e);
        e
    })
}
