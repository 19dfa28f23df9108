//! Kiosk settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every field has a default, so a partial `settings.toml` is valid.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::api::Endpoint;
use crate::pipeline::Stage;

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Where the kiosk backend endpoints live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend, without a trailing slash.
    pub base_url: String,
    pub translate_path: String,
    pub morphs_path: String,
    pub similarities_path: String,
    pub pickup_path: String,
    /// Per-request timeout.  `None` keeps the HTTP client's defaults.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:18000".into(),
            translate_path: "/api/translate".into(),
            morphs_path: "/api/morphs".into(),
            similarities_path: "/api/similarities".into(),
            pickup_path: "/api/pickup".into(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    /// Full URL of `endpoint`.
    ///
    /// ```
    /// use candy_kiosk::api::Endpoint;
    /// use candy_kiosk::config::ApiConfig;
    ///
    /// let api = ApiConfig::default();
    /// assert_eq!(api.url_for(Endpoint::Morphs), "http://localhost:18000/api/morphs");
    /// ```
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::Translate => &self.translate_path,
            Endpoint::Morphs => &self.morphs_path,
            Endpoint::Similarities => &self.similarities_path,
            Endpoint::Pickup => &self.pickup_path,
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

// ---------------------------------------------------------------------------
// LanguageConfig
// ---------------------------------------------------------------------------

/// Spoken language and the language the analysis services work in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Language visitors speak, sent as `source` to the translator.
    pub source: String,
    /// Language of the translated text, sent as `lang` to the analysers.
    pub target: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            source: "no".into(),
            target: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// StageDelays
// ---------------------------------------------------------------------------

/// Minimum display time of each stage's result, in milliseconds.
///
/// The successor stage is entered this long after the stage's work
/// resolved, however long the work itself took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDelays {
    /// From end of speech to the translate request.
    pub capture_ms: u64,
    pub translate_ms: u64,
    pub analyze_ms: u64,
    pub present_graph_ms: u64,
    pub present_image_ms: u64,
    /// How long the selected item stays on screen while it is dispensed.
    pub select_ms: u64,
}

impl Default for StageDelays {
    fn default() -> Self {
        Self {
            capture_ms: 500,
            translate_ms: 5_000,
            analyze_ms: 5_000,
            present_graph_ms: 5_000,
            present_image_ms: 7_000,
            select_ms: 8_000,
        }
    }
}

impl StageDelays {
    /// All delays zero.  Handy for tests and dry runs.
    pub fn none() -> Self {
        Self {
            capture_ms: 0,
            translate_ms: 0,
            analyze_ms: 0,
            present_graph_ms: 0,
            present_image_ms: 0,
            select_ms: 0,
        }
    }

    /// Delay between `stage` resolving and its successor being entered.
    ///
    /// `Select` hands over to `Dispense` at once; the selection's display
    /// time runs from `Dispense` to `Thank`.  Terminal stages have no
    /// successor and therefore no delay.
    pub fn for_stage(&self, stage: Stage) -> Duration {
        let ms = match stage {
            Stage::Capture => self.capture_ms,
            Stage::Translate => self.translate_ms,
            Stage::Analyze => self.analyze_ms,
            Stage::PresentGraph => self.present_graph_ms,
            Stage::PresentImage => self.present_image_ms,
            Stage::Select => 0,
            Stage::Dispense => self.select_ms,
            Stage::Thank | Stage::Sorry => 0,
        };
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// KioskConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level kiosk configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use candy_kiosk::config::KioskConfig;
///
/// // Load (returns Default when file is missing)
/// let config = KioskConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Backend endpoint locations.
    pub api: ApiConfig,
    /// Spoken and analysis languages.
    pub language: LanguageConfig,
    /// Per-stage display times.
    pub delays: StageDelays,
}

impl KioskConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(KioskConfig::default())` when the file does not exist yet.
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
