// Desktop configuration loaded once at startup from desktop.json

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Window manager tunables. All sizes are CSS pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WmConfig {
    pub min_width: f64,
    pub min_height: f64,
    /// Distance from a viewport edge at which a dragged window docks to it
    pub snap_threshold: f64,
    pub menu_bar_height: f64,
    pub title_bar_height: f64,
    pub default_width: f64,
    pub default_height: f64,
    /// Used for whichever of left/top was not supplied when the other was
    pub default_offset: f64,
    /// Shift applied to each additional centered window
    pub cascade_step: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            min_width: 200.0,
            min_height: 150.0,
            snap_threshold: 20.0,
            menu_bar_height: 28.0,
            title_bar_height: 32.0,
            default_width: 640.0,
            default_height: 440.0,
            default_offset: 80.0,
            cascade_step: 24.0,
            viewport_width: 1280.0,
            viewport_height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Directory holding the UI sound effects
    pub directory: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            directory: "../src/assets/audio/UI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub window_manager: WmConfig,
    pub sounds: SoundConfig,
}

impl DesktopConfig {
    /// Read `path`; a missing file means defaults, a malformed one is logged
    /// and replaced by defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded desktop config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid desktop config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
