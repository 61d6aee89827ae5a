//! Configuration for the schemaform workspace.
//!
//! [`Settings`] holds the knobs shared across the workspace: logging,
//! the default maximum character length for text-like fields, and the
//! upload folder used by the folder-backed file store. Settings can be
//! built in code, loaded from a TOML string or file, and optionally
//! installed as a process-wide instance.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{FormError, FormResult};

/// Default maximum character length for text-like fields.
pub const MAX_CHAR_LENGTH: usize = 512;

/// Workspace configuration.
///
/// All fields have serde defaults, so a partial TOML document is enough:
///
/// ```
/// use schemaform_core::Settings;
///
/// let settings = Settings::from_toml_str(r#"
///     log_level = "debug"
///     upload_folder = "/tmp/uploads"
/// "#).unwrap();
/// assert_eq!(settings.log_level, "debug");
/// assert_eq!(settings.max_char_length, 512);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the process runs in debug mode (affects log formatting).
    pub debug: bool,
    /// The tracing filter directive (e.g. `"info"`, `"schemaform=debug"`).
    pub log_level: String,
    /// Default maximum character length applied to text-like fields that
    /// do not declare their own.
    pub max_char_length: usize,
    /// Folder the default file store writes uploads into.
    pub upload_folder: Option<PathBuf>,
    /// Whether uploads are sharded into per-field subfolders.
    pub upload_separate: bool,
    /// Name of the hidden input carrying the record key on edit forms.
    pub record_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            max_char_length: MAX_CHAR_LENGTH,
            upload_folder: None,
            upload_separate: false,
            record_key: "_id".to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from a TOML document.
    pub fn from_toml_str(raw: &str) -> FormResult<Self> {
        toml::from_str(raw).map_err(|e| FormError::Configuration(e.to_string()))
    }

    /// Loads settings from a TOML file on disk.
    pub fn load(path: impl AsRef<std::path::Path>) -> FormResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Installs the process-wide settings instance.
///
/// Returns an error if settings were already configured.
pub fn configure(settings: Settings) -> FormResult<()> {
    SETTINGS
        .set(settings)
        .map_err(|_| FormError::Configuration("settings already configured".to_string()))
}

/// Returns the process-wide settings, falling back to defaults if
/// [`configure`] was never called.
pub fn current() -> &'static Settings {
    SETTINGS.get_or_init(Settings::default)
}
