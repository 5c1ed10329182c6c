// Window manager: lifecycle, stacking and pointer gestures for desktop windows

pub mod geometry;
pub mod gesture;
pub mod resources;

use self::geometry::{drag_to, initial_bounds, resize_to, workspace, Point, ResizeHandle, Viewport};
use self::gesture::{Gesture, GestureError};
use self::resources::WindowResources;
use crate::config::WmConfig;
use crate::state::preferences::PreferenceStore;
use crate::state::window::{WindowInstance, WindowOptions};
use crate::state::StateManager;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of fully closing a window
#[derive(Debug, Clone)]
pub struct ClosedWindow {
    pub window: WindowInstance,
    /// True when this was the app's last window and it left the running set
    pub app_released: bool,
    /// Window that took over focus, if the closed one held it
    pub refocused: Option<WindowInstance>,
}

pub struct WindowManager {
    state: StateManager,
    config: WmConfig,
    viewport: Viewport,
    gesture: Gesture,
    resources: HashMap<String, WindowResources>,
    runtime: Handle,
}

impl WindowManager {
    pub fn new(config: WmConfig, preferences: PreferenceStore, runtime: Handle) -> Self {
        let viewport = Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
        };
        Self {
            state: StateManager::new(preferences),
            config,
            viewport,
            gesture: Gesture::Idle,
            resources: HashMap::new(),
            runtime,
        }
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    #[cfg(test)]
    pub fn config(&self) -> &WmConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[cfg(test)]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Record a new viewport size and re-fit maximized windows to it.
    /// Returns the windows whose geometry changed.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Vec<WindowInstance> {
        self.viewport = viewport;
        let area = workspace(&self.config, viewport);
        self.state
            .windows
            .values_mut()
            .filter(|w| w.is_maximized)
            .map(|w| {
                w.bounds = area;
                w.clone()
            })
            .collect()
    }

    /// Open a new window for `app_name`, register it and bring it to the front.
    /// Apps attach their timers and teardown through `resources(&id)`.
    pub fn create_window(
        &mut self,
        app_name: &str,
        title: &str,
        content_key: &str,
        options: WindowOptions,
    ) -> WindowInstance {
        let id = self.generate_id(app_name);
        let bounds = initial_bounds(&self.config, self.viewport, &options, self.state.windows.len());
        let z_index = self.state.get_next_z_index();

        let window = WindowInstance {
            id: id.clone(),
            app_name: app_name.to_string(),
            title: title.to_string(),
            content_key: content_key.to_string(),
            bounds,
            z_index,
            is_maximized: false,
            is_minimized: false,
            is_closing: false,
            original_bounds: None,
            resizable: options.resizable.unwrap_or(true),
            minimizable: options.minimizable.unwrap_or(true),
            maximizable: options.maximizable.unwrap_or(true),
        };

        let snapshot = window.clone();
        self.state.add_window(window);
        self.resources
            .insert(id.clone(), WindowResources::new(id.clone(), self.runtime.clone()));

        info!(window = %id, app = app_name, "window created");
        self.focus_window(&id).unwrap_or(snapshot)
    }

    /// Timer and teardown scope of an open window.
    pub fn resources(&mut self, id: &str) -> Option<&mut WindowResources> {
        self.resources.get_mut(id)
    }

    /// Raise `id` to the top of the stack and make it active.
    pub fn focus_window(&mut self, id: &str) -> Option<WindowInstance> {
        if self.state.get_window(id)?.is_closing {
            return None;
        }
        let z_index = self.state.set_active_window(id)?;
        let window = self.state.get_window_mut(id)?;
        window.z_index = z_index;
        debug!(window = %id, z_index, "focused");
        Some(window.clone())
    }

    /// First phase of closing: release the window's resources and mark it
    /// `closing` so the frontend can play its transition. The window stays
    /// registered until `finish_close`. Focus moves to the top-most visible
    /// window. `None` if the window is unknown or already closing.
    pub fn begin_close(&mut self, id: &str) -> Option<WindowInstance> {
        if self.state.get_window(id)?.is_closing {
            return None;
        }

        if let Some(mut resources) = self.resources.remove(id) {
            resources.release();
        }
        if self.gesture.window() == Some(id) {
            self.gesture = Gesture::Idle;
        }

        let window = self.state.get_window_mut(id)?;
        window.is_closing = true;
        let closing = window.clone();
        info!(window = %id, "window closing");

        self.refocus_from(id);
        Some(closing)
    }

    /// Second phase of closing: deregister and update the running-app set.
    pub fn finish_close(&mut self, id: &str) -> Option<ClosedWindow> {
        // Resources are normally released by begin_close; cover direct callers
        if let Some(mut resources) = self.resources.remove(id) {
            resources.release();
        }
        if self.gesture.window() == Some(id) {
            self.gesture = Gesture::Idle;
        }

        let window = self.state.remove_window(id)?;
        let app_released = self.state.release_app_if_idle(&window.app_name);
        let refocused = self.refocus_from(id);
        info!(window = %id, app = %window.app_name, app_released, "window removed");
        Some(ClosedWindow {
            window,
            app_released,
            refocused,
        })
    }

    /// If `leaving` held focus (or focus is empty), hand it to the top-most
    /// window that is neither minimized nor closing.
    fn refocus_from(&mut self, leaving: &str) -> Option<WindowInstance> {
        if self
            .state
            .active_window_id()
            .is_some_and(|active| active != leaving)
        {
            return None;
        }
        let next = self
            .stacking_order()
            .into_iter()
            .rev()
            .find(|w| w.id != leaving && !w.is_minimized && !w.is_closing)?;
        self.focus_window(&next.id)
    }

    /// Close in one step: cleanup first, then deregistration. Also finishes
    /// a window that is already mid-transition.
    pub fn close_window(&mut self, id: &str) -> Option<ClosedWindow> {
        self.begin_close(id);
        self.finish_close(id)
    }

    /// Hide the window. Geometry, z-index and the focus record are kept.
    pub fn minimize_window(&mut self, id: &str) -> Option<WindowInstance> {
        let window = self.state.get_window_mut(id)?;
        if !window.minimizable || window.is_closing {
            return None;
        }
        window.is_minimized = true;
        let snapshot = window.clone();

        if self.gesture.window() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        debug!(window = %id, "minimized");
        Some(snapshot)
    }

    /// Show a minimized window again and focus it.
    pub fn restore_window(&mut self, id: &str) -> Option<WindowInstance> {
        let window = self.state.get_window_mut(id)?;
        if window.is_closing {
            return None;
        }
        window.is_minimized = false;
        self.focus_window(id)
    }

    /// Maximize into the workspace, or restore the geometry saved on the way in.
    /// Minimized windows are left alone until restored.
    pub fn toggle_maximize(&mut self, id: &str) -> Option<WindowInstance> {
        let area = workspace(&self.config, self.viewport);
        let window = self.state.get_window_mut(id)?;
        if !window.maximizable || window.is_closing || window.is_minimized {
            return None;
        }

        if window.is_maximized {
            if let Some(original) = window.original_bounds.take() {
                window.bounds = original;
            }
            window.is_maximized = false;
        } else {
            window.original_bounds = Some(window.bounds);
            window.bounds = area;
            window.is_maximized = true;
        }
        let maximized = window.is_maximized;

        if self.gesture.window() == Some(id) {
            self.gesture = Gesture::Idle;
        }
        debug!(window = %id, maximized, "toggled maximize");
        self.focus_window(id)
    }

    /// The app's most recently focused live window, for single-instance apps.
    pub fn get_window_by_app(&self, app_name: &str) -> Option<WindowInstance> {
        self.state
            .windows
            .values()
            .filter(|w| w.app_name == app_name && !w.is_closing)
            .max_by_key(|w| w.z_index)
            .cloned()
    }

    pub fn get_active_window(&self) -> Option<WindowInstance> {
        self.state.get_active_window().cloned()
    }

    /// True when `id` is visible and focused; animation loops pause otherwise.
    pub fn is_foreground(&self, id: &str) -> bool {
        self.state
            .get_window(id)
            .map(|w| !w.is_minimized && !w.is_closing)
            .unwrap_or(false)
            && self.state.active_window_id() == Some(id)
    }

    /// Windows sorted back to front.
    pub fn stacking_order(&self) -> Vec<WindowInstance> {
        let mut windows = self.state.get_all_windows();
        windows.sort_by_key(|w| w.z_index);
        windows
    }

    /// Focus the bottom-most visible window, rotating through the stack.
    pub fn cycle_focus(&mut self) -> Option<WindowInstance> {
        let next = self
            .stacking_order()
            .into_iter()
            .find(|w| !w.is_minimized && !w.is_closing)?;
        self.focus_window(&next.id)
    }

    /// Pointer-down on a title bar. Focuses the window and starts dragging it.
    pub fn begin_drag(&mut self, id: &str, pointer: Point) -> Result<WindowInstance, GestureError> {
        if let Some(err) = self.gesture.busy() {
            return Err(err);
        }
        let window = self
            .state
            .get_window(id)
            .filter(|w| !w.is_closing)
            .ok_or_else(|| GestureError::WindowNotFound(id.to_string()))?;
        if window.is_maximized {
            return Err(GestureError::Maximized(id.to_string()));
        }
        if window.is_minimized {
            return Err(GestureError::Minimized(id.to_string()));
        }

        let focused = self
            .focus_window(id)
            .ok_or_else(|| GestureError::WindowNotFound(id.to_string()))?;
        self.gesture = Gesture::Dragging {
            window: id.to_string(),
            start_pointer: pointer,
            start_bounds: focused.bounds,
        };
        debug!(window = %id, x = pointer.x, y = pointer.y, "drag started");
        Ok(focused)
    }

    /// Pointer-down on one of the eight resize handles.
    pub fn begin_resize(
        &mut self,
        id: &str,
        handle: ResizeHandle,
        pointer: Point,
    ) -> Result<WindowInstance, GestureError> {
        if let Some(err) = self.gesture.busy() {
            return Err(err);
        }
        let window = self
            .state
            .get_window(id)
            .filter(|w| !w.is_closing)
            .ok_or_else(|| GestureError::WindowNotFound(id.to_string()))?;
        if !window.resizable {
            return Err(GestureError::NotResizable(id.to_string()));
        }
        if window.is_maximized {
            return Err(GestureError::Maximized(id.to_string()));
        }
        if window.is_minimized {
            return Err(GestureError::Minimized(id.to_string()));
        }

        let focused = self
            .focus_window(id)
            .ok_or_else(|| GestureError::WindowNotFound(id.to_string()))?;
        self.gesture = Gesture::Resizing {
            window: id.to_string(),
            handle,
            start_pointer: pointer,
            start_bounds: focused.bounds,
        };
        debug!(window = %id, ?handle, "resize started");
        Ok(focused)
    }

    /// Apply the in-flight gesture for the current pointer position.
    /// `None` when idle or when the window has gone away.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<WindowInstance> {
        let (dx, dy) = self.gesture.delta(pointer)?;
        let (id, next) = match &self.gesture {
            Gesture::Idle => return None,
            Gesture::Dragging {
                window,
                start_bounds,
                ..
            } => (
                window.clone(),
                drag_to(&self.config, self.viewport, *start_bounds, dx, dy),
            ),
            Gesture::Resizing {
                window,
                handle,
                start_bounds,
                ..
            } => (
                window.clone(),
                resize_to(&self.config, *start_bounds, *handle, dx, dy),
            ),
        };

        match self.state.get_window_mut(&id) {
            Some(window) => {
                window.bounds = next;
                Some(window.clone())
            }
            None => {
                self.gesture = Gesture::Idle;
                None
            }
        }
    }

    /// Pointer-up: the gesture ends and the slot returns to idle.
    pub fn pointer_up(&mut self) -> Option<WindowInstance> {
        let gesture = std::mem::take(&mut self.gesture);
        let id = gesture.window()?;
        debug!(window = %id, "gesture ended");
        self.state.get_window(id).cloned()
    }

    fn generate_id(&self, app_name: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let id = format!("{}-{}-{}", app_name, millis, &suffix[..8]);
            if !self.state.windows.contains_key(&id) {
                return id;
            }
        }
    }
}
