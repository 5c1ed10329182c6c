// Desktop-wide keyboard shortcuts. Every action targets the active window.

use crate::state::window::WindowInstance;
use crate::window_manager::WindowManager;
use tauri_plugin_global_shortcut::{Code, Modifiers, Shortcut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    CloseActive,
    MinimizeActive,
    ToggleMaximizeActive,
    CycleFocus,
}

/// What a shortcut did, for the host to forward to the frontend
#[derive(Debug, Clone)]
pub enum ShortcutOutcome {
    /// Window began its closing transition
    Closing(WindowInstance),
    /// Window geometry, flags or z-index changed
    Updated(WindowInstance),
}

pub fn default_bindings() -> Vec<(Shortcut, ShortcutAction)> {
    let mods = Some(Modifiers::CONTROL | Modifiers::ALT);
    vec![
        (Shortcut::new(mods, Code::KeyW), ShortcutAction::CloseActive),
        (Shortcut::new(mods, Code::KeyM), ShortcutAction::MinimizeActive),
        (Shortcut::new(mods, Code::KeyF), ShortcutAction::ToggleMaximizeActive),
        (Shortcut::new(mods, Code::Backquote), ShortcutAction::CycleFocus),
    ]
}

pub fn action_for(shortcut: &Shortcut) -> Option<ShortcutAction> {
    default_bindings()
        .into_iter()
        .find(|(bound, _)| bound == shortcut)
        .map(|(_, action)| action)
}

/// Run `action` against the active window. Nothing happens without one.
pub fn apply(wm: &mut WindowManager, action: ShortcutAction) -> Option<ShortcutOutcome> {
    if action == ShortcutAction::CycleFocus {
        return wm.cycle_focus().map(ShortcutOutcome::Updated);
    }

    let active = wm.get_active_window()?;
    if active.is_minimized {
        return None;
    }
    match action {
        ShortcutAction::CloseActive => wm.begin_close(&active.id).map(ShortcutOutcome::Closing),
        ShortcutAction::MinimizeActive => wm.minimize_window(&active.id).map(ShortcutOutcome::Updated),
        ShortcutAction::ToggleMaximizeActive => {
            wm.toggle_maximize(&active.id).map(ShortcutOutcome::Updated)
        }
        ShortcutAction::CycleFocus => None,
    }
}
