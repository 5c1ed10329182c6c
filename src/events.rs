// Events pushed to the frontend

use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter};
use tracing::warn;

pub const WINDOW_CREATED: &str = "window-created";
pub const WINDOW_UPDATED: &str = "window-updated";
pub const WINDOW_STATE_CHANGED: &str = "window-state-changed";
pub const WINDOW_CLOSED: &str = "window-closed";
pub const FOCUS_CHANGED: &str = "focus-changed";
pub const RUNNING_APPS_CHANGED: &str = "running-apps-changed";
pub const PREFERENCE_CHANGED: &str = "preference-changed";
pub const PET_UPDATED: &str = "pet-updated";

/// Anything that can deliver a named JSON payload to the frontend.
/// Background timers hold one of these instead of the whole app handle.
pub trait EventSink: Send + Sync + 'static {
    fn emit_value(&self, event: &str, payload: Value);
}

impl EventSink for AppHandle {
    fn emit_value(&self, event: &str, payload: Value) {
        if let Err(e) = self.emit(event, payload) {
            warn!(event, error = %e, "failed to emit event");
        }
    }
}

/// Serialize `payload` and emit it; serialization failures are logged.
pub fn emit<S: EventSink + ?Sized, T: Serialize>(sink: &S, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => sink.emit_value(event, value),
        Err(e) => warn!(event, error = %e, "failed to serialize event payload"),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records every event for assertions
    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingSink {
        pub fn names(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn emit_value(&self, event: &str, payload: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), payload));
        }
    }
}
