//! Storage module
//!
//! Provides file access scoped to the application-config root.

pub mod config_dir;

pub use config_dir::{init_directory, user_dir, ConfigDir, FsConfigDir};
