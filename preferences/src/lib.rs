//! Pomodoro preferences library
//!
//! User preferences persisted as a JSON document under the application-config
//! directory, plus the event bus components use to notify each other.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
