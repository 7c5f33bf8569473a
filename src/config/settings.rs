//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Connection settings for the remote recommendation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Full URL that receives `POST { "query": … }`.
    pub endpoint: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/recommend".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DictationConfig
// ---------------------------------------------------------------------------

/// Settings for voice dictation (microphone capture + Whisper).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// BCP-47 locale of the recognition session (e.g. `"en-US"`).
    pub locale: String,
    /// GGML model file stem under the models directory.
    pub model: String,
    /// RMS amplitude above which a 30 ms frame counts as speech.
    pub speech_threshold: f32,
    /// Silence after speech that ends the utterance, in milliseconds.
    pub end_silence_ms: u64,
    /// Give up when nothing is said for this long, in milliseconds.
    pub no_speech_timeout_ms: u64,
    /// Hard cap on a single utterance, in seconds.
    pub max_utterance_secs: f32,
}

impl Default for DictationConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            model: "ggml-base.en".into(),
            speech_threshold: 0.01,
            end_silence_ms: 1_200,
            no_speech_timeout_ms: 5_000,
            max_utterance_secs: 15.0,
        }
    }
}

/// Whisper language code of a locale: the primary subtag, lowercased
/// (`"en-US"` → `"en"`).
pub fn language_of(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// ClipboardConfig
// ---------------------------------------------------------------------------

/// Copy-to-clipboard acknowledgement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// How long the "copied" acknowledgement stays visible, in milliseconds.
    pub revert_delay_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            revert_delay_ms: 2_000,
        }
    }
}

impl ClipboardConfig {
    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window position `(x, y)` in screen pixels.  `None` lets the
    /// window manager decide.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use recommend_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("{}", config.service.endpoint);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Recommendation service settings.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Voice dictation settings.
    #[serde(default)]
    pub dictation: DictationConfig,
    /// Clipboard acknowledgement settings.
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    /// Window settings.
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet,
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
