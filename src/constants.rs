//! Application-wide constants
//!
//! Storage keys, reserved identifiers and the built-in defaults used by the
//! studio, kept in one place so the store, the studio and the GUI agree.

/// Configuration file location
pub mod config {
    /// Directory name under the platform config/data dirs
    pub const APP_DIR: &str = "qr-studio";

    /// Configuration file name
    pub const FILENAME: &str = "config.json";

    /// Env var overriding the data directory
    pub const DATA_DIR_ENV: &str = "QR_STUDIO_DATA_DIR";

    /// Env var overriding the locales directory
    pub const LOCALES_DIR_ENV: &str = "QR_STUDIO_LOCALES_DIR";

    /// Env var selecting the log level
    pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
}

/// Namespaced keys of the persistent store
pub mod storage {
    pub const FOLDERS_KEY: &str = "qr_folders";
    pub const PROJECTS_KEY: &str = "qr_projects";
    pub const TEMPLATES_KEY: &str = "qr_templates";
    pub const LANGUAGE_KEY: &str = "qr_lang";
}

/// Folder constants
pub mod folders {
    /// Reserved id of the folder that always exists and cannot be deleted
    pub const DEFAULT_FOLDER_ID: &str = "default";

    /// Stored name of the default folder (the GUI shows a localized one)
    pub const DEFAULT_FOLDER_NAME: &str = "Default";
}

/// Studio defaults
pub mod studio {
    /// Trailing-edge quiescence window before a render update fires
    pub const DEBOUNCE_MS: u64 = 300;

    /// Payload shown after startup and reset
    pub const DEFAULT_DATA: &str = "https://react.dev";

    /// Payload placed in the form when switching to the URL type
    pub const URL_PLACEHOLDER: &str = "https://";

    /// Preview size in pixels
    pub const DEFAULT_SIZE: u32 = 300;

    pub const DEFAULT_MARGIN: u32 = 10;
    pub const DEFAULT_IMAGE_SIZE: f32 = 0.4;
    pub const DEFAULT_IMAGE_MARGIN: u32 = 10;
    pub const DEFAULT_DOT_COLOR: &str = "#000000";
    pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

    /// Base name of downloaded files
    pub const DOWNLOAD_NAME: &str = "qr-code";

    /// Resolutions offered for export
    pub const DOWNLOAD_RESOLUTIONS: [u32; 4] = [512, 1024, 2048, 4096];
}

/// Config validation bounds
pub mod validation {
    pub const MAX_DEBOUNCE_MS: u64 = 5000;
    pub const MIN_EXPORT_SIZE: u32 = 64;
    pub const MAX_EXPORT_SIZE: u32 = 4096;

    /// Logo size ratio bounds (fraction of the symbol)
    pub const MIN_IMAGE_SIZE: f32 = 0.1;
    pub const MAX_IMAGE_SIZE: f32 = 0.7;
}

/// Localization
pub mod i18n {
    /// Language used when nothing is stored or a bundle fails to load
    pub const DEFAULT_LANGUAGE: &str = "id";
}
