use super::{AppContext, Application};
use crate::pty::PtyError;
use crate::state::window::{WindowInstance, WindowOptions};
use crate::window_manager::WindowManager;
use tracing::warn;

/// Shell window. Each window owns a PTY session keyed by the window id;
/// the session is torn down when the window closes.
pub struct Terminal;

impl Application for Terminal {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn title(&self) -> &'static str {
        "Terminal"
    }

    fn window_options(&self) -> WindowOptions {
        WindowOptions::sized(720.0, 440.0)
    }

    fn single_instance(&self) -> bool {
        false
    }

    fn attach(
        &self,
        window: &WindowInstance,
        wm: &mut WindowManager,
        ctx: &AppContext,
    ) -> Result<(), String> {
        {
            let mut manager = ctx.pty.0.lock().map_err(|e| e.to_string())?;
            manager.spawn(&window.id).map_err(|e| e.to_string())?;
        }

        let pty = ctx.pty.clone();
        let session_id = window.id.clone();
        if let Some(resources) = wm.resources(&window.id) {
            resources.on_close(move || {
                let Ok(mut manager) = pty.0.lock() else {
                    return;
                };
                match manager.close(&session_id) {
                    Ok(()) | Err(PtyError::NotFound(_)) => {}
                    Err(e) => warn!(session = %session_id, error = %e, "failed to close pty"),
                }
            });
        }
        Ok(())
    }
}
