//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\recommend-assistant\
//!   macOS:   ~/Library/Application Support/recommend-assistant/
//!   Linux:   ~/.config/recommend-assistant/
//!
//! Data dir (speech models):
//!   Windows: %LOCALAPPDATA%\recommend-assistant\
//!   macOS:   ~/Library/Application Support/recommend-assistant/
//!   Linux:   ~/.local/share/recommend-assistant/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for GGML Whisper model files.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "recommend-assistant";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let models_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            models_dir,
        }
    }

    /// Path of the model file for a `dictation.model` stem.
    pub fn model_file(&self, model: &str) -> PathBuf {
        self.models_dir.join(format!("{model}.bin"))
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
