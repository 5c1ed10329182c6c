use std::collections::{BTreeSet, HashMap};
use serde_json::Value;
use self::preferences::{PreferenceError, PreferenceStore};
use self::window::WindowInstance;

pub mod preferences;
pub mod window;

/// Shared UI state: open windows, stacking counter, focus and running apps.
/// Lives for the whole session; only `preferences` survive a restart.
pub struct StateManager {
    pub windows: HashMap<String, WindowInstance>,
    z_counter: u32,
    active_window_id: Option<String>,
    running_apps: BTreeSet<String>, // Drives the dock "running" dots
    preferences: PreferenceStore,
}

impl StateManager {
    pub fn new(preferences: PreferenceStore) -> Self {
        Self {
            windows: HashMap::new(),
            z_counter: 0,
            active_window_id: None,
            running_apps: BTreeSet::new(),
            preferences,
        }
    }

    /// Register a window and mark its app as running
    pub fn add_window(&mut self, window: WindowInstance) {
        self.running_apps.insert(window.app_name.clone());
        self.windows.insert(window.id.clone(), window);
    }

    /// Deregister a window. `running_apps` is left alone; callers use
    /// `release_app_if_idle` once they know whether siblings remain.
    pub fn remove_window(&mut self, id: &str) -> Option<WindowInstance> {
        let removed = self.windows.remove(id);
        if removed.is_some() && self.active_window_id.as_deref() == Some(id) {
            self.active_window_id = None;
        }
        removed
    }

    /// Drop `app_name` from the running set if none of its windows remain.
    /// Returns true if the set changed.
    pub fn release_app_if_idle(&mut self, app_name: &str) -> bool {
        let still_open = self.windows.values().any(|w| w.app_name == app_name);
        if still_open {
            false
        } else {
            self.running_apps.remove(app_name)
        }
    }

    pub fn get_window(&self, id: &str) -> Option<&WindowInstance> {
        self.windows.get(id)
    }

    pub fn get_window_mut(&mut self, id: &str) -> Option<&mut WindowInstance> {
        self.windows.get_mut(id)
    }

    pub fn get_all_windows(&self) -> Vec<WindowInstance> {
        self.windows.values().cloned().collect()
    }

    /// Focus `id` and hand back the z-index the caller should apply.
    /// `None` if the window is not registered.
    pub fn set_active_window(&mut self, id: &str) -> Option<u32> {
        if !self.windows.contains_key(id) {
            return None;
        }
        self.z_counter += 1;
        self.active_window_id = Some(id.to_string());
        Some(self.z_counter)
    }

    pub fn get_next_z_index(&mut self) -> u32 {
        self.z_counter += 1;
        self.z_counter
    }

    pub fn active_window_id(&self) -> Option<&str> {
        self.active_window_id.as_deref()
    }

    pub fn get_active_window(&self) -> Option<&WindowInstance> {
        self.active_window_id
            .as_deref()
            .and_then(|id| self.windows.get(id))
    }

    pub fn running_apps(&self) -> &BTreeSet<String> {
        &self.running_apps
    }

    pub fn is_running(&self, app_name: &str) -> bool {
        self.running_apps.contains(app_name)
    }

    pub fn get_preference(&self, key: &str) -> Option<&Value> {
        self.preferences.get(key)
    }

    pub fn set_preference(&mut self, key: &str, value: Value) -> Result<(), PreferenceError> {
        self.preferences.set(key, value)
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }
}

#[cfg(test)]
mod tests {
    use super::window::Bounds;
    use super::*;
    use serde_json::json;

    fn window(id: &str, app: &str) -> WindowInstance {
        WindowInstance {
            id: id.to_string(),
            app_name: app.to_string(),
            title: app.to_string(),
            content_key: app.to_string(),
            bounds: Bounds::new(0.0, 0.0, 100.0, 100.0),
            z_index: 0,
            is_maximized: false,
            is_minimized: false,
            is_closing: false,
            original_bounds: None,
            resizable: true,
            minimizable: true,
            maximizable: true,
        }
    }

    #[test]
    fn add_marks_app_running() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.add_window(window("a", "notes"));
        assert!(state.is_running("notes"));
        assert!(state.get_window("a").is_some());
    }

    #[test]
    fn release_only_when_last_window_gone() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.add_window(window("a", "notes"));
        state.add_window(window("b", "notes"));

        state.remove_window("a");
        assert!(!state.release_app_if_idle("notes"));
        assert!(state.is_running("notes"));

        state.remove_window("b");
        assert!(state.release_app_if_idle("notes"));
        assert!(!state.is_running("notes"));
    }

    #[test]
    fn set_active_window_is_monotonic_and_checked() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.add_window(window("a", "notes"));
        state.add_window(window("b", "finder"));

        let first = state.set_active_window("a").unwrap();
        let second = state.set_active_window("b").unwrap();
        assert!(second > first);
        assert_eq!(state.active_window_id(), Some("b"));

        assert_eq!(state.set_active_window("ghost"), None);
        assert_eq!(state.active_window_id(), Some("b"));
    }

    #[test]
    fn next_z_index_does_not_change_focus() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.add_window(window("a", "notes"));
        state.set_active_window("a");
        let z = state.get_next_z_index();
        assert_eq!(state.get_next_z_index(), z + 1);
        assert_eq!(state.active_window_id(), Some("a"));
    }

    #[test]
    fn removing_active_window_clears_focus() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.add_window(window("a", "notes"));
        state.set_active_window("a");
        state.remove_window("a");
        assert!(state.get_active_window().is_none());
        assert!(state.remove_window("a").is_none());
    }

    #[test]
    fn preferences_round_through_state() {
        let mut state = StateManager::new(PreferenceStore::in_memory());
        state.set_preference("theme", json!("dark")).unwrap();
        assert_eq!(state.get_preference("theme"), Some(&json!("dark")));
        assert_eq!(state.get_preference("missing"), None);
    }
}
