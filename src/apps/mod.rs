// Desktop applications: a small trait plus a registry filled at startup

pub mod builtin;
pub mod pet;
pub mod terminal;

use crate::events::EventSink;
use crate::pty::PtyState;
use crate::state::window::{WindowInstance, WindowOptions};
use crate::window_manager::{ClosedWindow, WindowManager};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown application: {0}")]
    Unknown(String),
    #[error("{app} failed to start: {reason}")]
    Launch { app: String, reason: String },
}

/// Services an app may use while opening
#[derive(Clone)]
pub struct AppContext {
    pub events: Arc<dyn EventSink>,
    pub pty: PtyState,
}

/// What `open` did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "window")]
pub enum Launch {
    /// An existing window was brought to the front
    Focused(WindowInstance),
    /// A new window was created
    Created(WindowInstance),
}

impl Launch {
    pub fn window(&self) -> &WindowInstance {
        match self {
            Launch::Focused(w) | Launch::Created(w) => w,
        }
    }
}

pub trait Application: Send + Sync {
    /// Identifier used in the dock and in `running_apps`
    fn name(&self) -> &'static str;

    fn title(&self) -> &'static str;

    /// Frontend component rendered inside the window
    fn content_key(&self) -> &'static str {
        self.name()
    }

    fn window_options(&self) -> WindowOptions {
        WindowOptions::default()
    }

    fn single_instance(&self) -> bool {
        true
    }

    /// Attach timers, hooks and backend resources to a freshly created window.
    fn attach(
        &self,
        _window: &WindowInstance,
        _wm: &mut WindowManager,
        _ctx: &AppContext,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Focus the existing window of a single-instance app, otherwise create one.
    fn open(&self, wm: &mut WindowManager, ctx: &AppContext) -> Result<Launch, AppError> {
        if self.single_instance() {
            if let Some(existing) = wm.get_window_by_app(self.name()) {
                let window = if existing.is_minimized {
                    wm.restore_window(&existing.id)
                } else {
                    wm.focus_window(&existing.id)
                };
                if let Some(window) = window {
                    return Ok(Launch::Focused(window));
                }
            }
        }

        let window = wm.create_window(
            self.name(),
            self.title(),
            self.content_key(),
            self.window_options(),
        );

        if let Err(reason) = self.attach(&window, wm, ctx) {
            warn!(app = self.name(), %reason, "app failed to attach, closing its window");
            wm.close_window(&window.id);
            return Err(AppError::Launch {
                app: self.name().to_string(),
                reason,
            });
        }

        Ok(Launch::Created(window))
    }

    /// Close every window this app owns.
    fn close(&self, wm: &mut WindowManager) -> Vec<ClosedWindow> {
        let ids: Vec<String> = wm
            .state()
            .windows
            .values()
            .filter(|w| w.app_name == self.name())
            .map(|w| w.id.clone())
            .collect();
        ids.iter().filter_map(|id| wm.close_window(id)).collect()
    }
}

/// Apps available on this desktop, keyed by name
pub struct AppRegistry {
    apps: BTreeMap<&'static str, Arc<dyn Application>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self {
            apps: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in app
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for app in builtin::catalog() {
            registry.register(Arc::new(app));
        }
        registry.register(Arc::new(terminal::Terminal));
        registry.register(Arc::new(pet::Pet::default()));
        info!(apps = registry.apps.len(), "app registry ready");
        registry
    }

    pub fn register(&mut self, app: Arc<dyn Application>) {
        self.apps.insert(app.name(), app);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Application>> {
        self.apps.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.apps.keys().copied().collect()
    }

    pub fn open(
        &self,
        name: &str,
        wm: &mut WindowManager,
        ctx: &AppContext,
    ) -> Result<Launch, AppError> {
        let app = self
            .get(name)
            .ok_or_else(|| AppError::Unknown(name.to_string()))?;
        app.open(wm, ctx)
    }

    pub fn close(&self, name: &str, wm: &mut WindowManager) -> Result<Vec<ClosedWindow>, AppError> {
        let app = self
            .get(name)
            .ok_or_else(|| AppError::Unknown(name.to_string()))?;
        Ok(app.close(wm))
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{context, manager};
    use super::*;
    use crate::events::testing::RecordingSink;

    struct Failing;

    impl Application for Failing {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn title(&self) -> &'static str {
            "Broken"
        }
        fn attach(&self, _: &WindowInstance, _: &mut WindowManager, _: &AppContext) -> Result<(), String> {
            Err("no backend".into())
        }
    }

    #[tokio::test]
    async fn open_twice_yields_one_focused_window() {
        let registry = AppRegistry::with_builtin();
        let ctx = context(Arc::new(RecordingSink::default()));
        let mut wm = manager(tokio::runtime::Handle::current());

        let first = registry.open("notes", &mut wm, &ctx).unwrap();
        let other = registry.open("finder", &mut wm, &ctx).unwrap();
        assert!(matches!(first, Launch::Created(_)));

        let second = registry.open("notes", &mut wm, &ctx).unwrap();
        let Launch::Focused(window) = second else {
            panic!("second open should focus");
        };
        assert_eq!(window.id, first.window().id);
        assert!(window.z_index > other.window().z_index);
        assert_eq!(
            wm.state()
                .windows
                .values()
                .filter(|w| w.app_name == "notes")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn single_instance_open_restores_minimized_window() {
        let registry = AppRegistry::with_builtin();
        let ctx = context(Arc::new(RecordingSink::default()));
        let mut wm = manager(tokio::runtime::Handle::current());

        let id = registry.open("notes", &mut wm, &ctx).unwrap().window().id.clone();
        wm.minimize_window(&id);
        let again = registry.open("notes", &mut wm, &ctx).unwrap();
        assert!(!again.window().is_minimized);
        assert_eq!(wm.state().active_window_id(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn multi_instance_apps_open_new_windows() {
        let registry = AppRegistry::with_builtin();
        let ctx = context(Arc::new(RecordingSink::default()));
        let mut wm = manager(tokio::runtime::Handle::current());

        registry.open("textedit", &mut wm, &ctx).unwrap();
        let second = registry.open("textedit", &mut wm, &ctx).unwrap();
        assert!(matches!(second, Launch::Created(_)));

        let closed = registry.close("textedit", &mut wm).unwrap();
        assert_eq!(closed.len(), 2);
        assert!(!wm.state().is_running("textedit"));
    }

    #[tokio::test]
    async fn failed_attach_leaves_no_window_behind() {
        let mut registry = AppRegistry::new();
        registry.register(Arc::new(Failing));
        let ctx = context(Arc::new(RecordingSink::default()));
        let mut wm = manager(tokio::runtime::Handle::current());

        let err = registry.open("broken", &mut wm, &ctx).unwrap_err();
        assert!(matches!(err, AppError::Launch { .. }));
        assert!(wm.state().windows.is_empty());
        assert!(!wm.state().is_running("broken"));
    }

    #[test]
    fn unknown_app_is_an_error() {
        let registry = AppRegistry::with_builtin();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let ctx = context(Arc::new(RecordingSink::default()));
        let mut wm = manager(rt.handle().clone());
        assert!(matches!(
            registry.open("solitaire", &mut wm, &ctx),
            Err(AppError::Unknown(_))
        ));
    }

    #[test]
    fn builtin_catalog_is_complete() {
        let names = AppRegistry::with_builtin().names();
        for app in [
            "browser", "calculator", "chip8", "finder", "notes", "pet", "settings", "terminal",
            "textedit",
        ] {
            assert!(names.contains(&app), "missing {app}");
        }
    }
}
