use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const THEME: &str = "theme";
pub const ACCENT_COLOR: &str = "accent_color";
pub const WALLPAPER: &str = "wallpaper";
pub const SOUND_ENABLED: &str = "sound_enabled";
pub const VOLUME: &str = "volume";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to write preferences to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
}

fn defaults() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(THEME.into(), json!("light"));
    map.insert(ACCENT_COLOR.into(), json!("#007aff"));
    map.insert(WALLPAPER.into(), json!("default"));
    map.insert(SOUND_ENABLED.into(), json!(true));
    map.insert(VOLUME.into(), json!(0.5));
    map
}

/// User settings that outlive the session. Every write goes straight to disk.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl PreferenceStore {
    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: defaults(),
        }
    }

    /// Load from `path`, layering stored values over the defaults.
    /// A missing or unreadable file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut values = defaults();

        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(stored) => {
                    info!(path = %path.display(), keys = stored.len(), "loaded preferences");
                    values.extend(stored);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "corrupt preferences, using defaults"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "unreadable preferences, using defaults"),
        }

        Self {
            path: Some(path),
            values,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn sound_enabled(&self) -> bool {
        self.get(SOUND_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Volume clamped to 0.0..=1.0.
    pub fn volume(&self) -> f32 {
        self.get(VOLUME)
            .and_then(Value::as_f64)
            .map(|v| v.clamp(0.0, 1.0) as f32)
            .unwrap_or(0.5)
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PreferenceError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let text = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, text).map_err(|source| PreferenceError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
