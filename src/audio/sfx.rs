use super::SoundEvent;
use rodio::{Decoder, OutputStreamHandle, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// SfxEngine handles low-latency window sounds.
/// Samples are preloaded into memory so playback starts instantly.
pub struct SfxEngine {
    stream_handle: OutputStreamHandle,
    samples: HashMap<SoundEvent, Vec<u8>>,
}

impl SfxEngine {
    pub fn new(stream_handle: OutputStreamHandle, directory: &Path) -> Self {
        let mut engine = Self {
            stream_handle,
            samples: HashMap::new(),
        };
        engine.preload(directory);
        engine
    }

    fn preload(&mut self, directory: &Path) {
        for event in SoundEvent::ALL {
            let path = directory.join(event.file_name());
            match std::fs::read(&path) {
                Ok(data) => {
                    debug!(sound = ?event, "loaded sample");
                    self.samples.insert(event, data);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "missing sound sample"),
            }
        }
    }

    pub fn loaded(&self) -> usize {
        self.samples.len()
    }

    pub fn play(&self, event: SoundEvent, volume: f32) {
        let Some(data) = self.samples.get(&event) else {
            return;
        };

        // Re-decoding from memory is fast enough for short UI samples
        match Decoder::new(Cursor::new(data.clone())) {
            Ok(source) => {
                let source = source.convert_samples::<f32>().amplify(volume);
                if let Err(e) = self.stream_handle.play_raw(source) {
                    warn!(sound = ?event, error = %e, "playback failed");
                }
            }
            Err(e) => warn!(sound = ?event, error = %e, "decode failed"),
        }
    }
}
