//! Configuration management for QR Studio
//!
//! A single JSON settings file under the platform config directory, with
//! environment overrides for the directories and the log level.

pub mod settings;

pub use settings::AppConfig;
