//! Configuration module for the candy kiosk.
//!
//! Provides `KioskConfig` (top-level settings), sub-configs for the backend
//! endpoints, languages and stage timing, `AppPaths` for the platform config
//! directory, and TOML persistence via `KioskConfig::load` / `KioskConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{ApiConfig, KioskConfig, LanguageConfig, StageDelays};
