pub mod sfx;

use self::sfx::SfxEngine;
use crate::state::preferences::PreferenceStore;
use rodio::{OutputStream, OutputStreamHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    NoDevice(String),
}

/// UI sounds the desktop can play
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundEvent {
    Open,
    Close,
    Minimize,
    Maximize,
    Click,
    Error,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 6] = [
        SoundEvent::Open,
        SoundEvent::Close,
        SoundEvent::Minimize,
        SoundEvent::Maximize,
        SoundEvent::Click,
        SoundEvent::Error,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SoundEvent::Open => "windowOpen.wav",
            SoundEvent::Close => "windowClose.wav",
            SoundEvent::Minimize => "windowMinimize.wav",
            SoundEvent::Maximize => "windowSizeChange.mp3",
            SoundEvent::Click => "cursorClick.wav",
            SoundEvent::Error => "error.wav",
        }
    }
}

/// Volume to play at, or `None` when sound is off or muted.
pub fn playback_volume(preferences: &PreferenceStore) -> Option<f32> {
    if !preferences.sound_enabled() {
        return None;
    }
    let volume = preferences.volume();
    (volume > 0.0).then_some(volume)
}

/// Open the default output device.
/// IMPORTANT: The caller MUST keep the OutputStream alive, but it cannot be shared across threads.
pub fn open_output() -> Result<(OutputStream, OutputStreamHandle), AudioError> {
    OutputStream::try_default().map_err(|e| AudioError::NoDevice(e.to_string()))
}

/// Effect engine bound to an output handle
pub struct AudioSystem {
    sfx: SfxEngine,
}

impl AudioSystem {
    pub fn new(stream_handle: OutputStreamHandle, directory: &Path) -> Self {
        let sfx = SfxEngine::new(stream_handle, directory);
        info!(samples = sfx.loaded(), "audio system initialized");
        Self { sfx }
    }
}

/// Sound manager: plays UI sounds when a device exists and the user allows it
pub struct SoundManager {
    system: Option<AudioSystem>,
}

impl SoundManager {
    pub fn new(system: Option<AudioSystem>) -> Self {
        if system.is_none() {
            warn!("sound manager running silent");
        }
        Self { system }
    }

    #[cfg(test)]
    pub fn silent() -> Self {
        Self { system: None }
    }

    #[cfg(test)]
    pub fn is_silent(&self) -> bool {
        self.system.is_none()
    }

    pub fn play(&self, event: SoundEvent, preferences: &PreferenceStore) {
        let (Some(system), Some(volume)) = (&self.system, playback_volume(preferences)) else {
            return;
        };
        system.sfx.play(event, volume);
    }
}

// Global state wrapper
pub struct AudioState(pub Arc<Mutex<SoundManager>>);
