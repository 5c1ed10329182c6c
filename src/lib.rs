// Application registry and built-in apps
mod apps;

// Wallpaper download cache
mod assets;

// Sound manager
mod audio;

// desktop.json
mod config;

// Frontend event names and sinks
mod events;

// PTY sessions backing terminal windows
mod pty;

// Desktop keyboard shortcuts
mod shortcuts;

// Shared UI state and preferences
mod state;

// Virtual filesystem for Finder / TextEdit / Terminal
mod vfs;

// Window lifecycle, stacking and gestures
mod window_manager;

use apps::{AppContext, AppRegistry, Launch};
use assets::{CachedWallpaper, WallpaperCache};
use audio::{AudioState, AudioSystem, SoundEvent, SoundManager};
use config::DesktopConfig;
use events::{
    FOCUS_CHANGED, PREFERENCE_CHANGED, RUNNING_APPS_CHANGED, WINDOW_CLOSED, WINDOW_CREATED,
    WINDOW_STATE_CHANGED, WINDOW_UPDATED,
};
use pty::{PtyManager, PtyState};
use serde::Serialize;
use serde_json::Value;
use shortcuts::ShortcutOutcome;
use state::preferences::PreferenceStore;
use state::window::{WindowInstance, WindowOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Manager, State};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tracing::{info, warn};
use vfs::{FileRecord, VirtualFs};
use window_manager::geometry::{Point, ResizeHandle, Viewport};
use window_manager::WindowManager;

// Window manager plus the apps that plug into it
struct DesktopState {
    wm: Arc<Mutex<WindowManager>>,
    apps: AppRegistry,
    ctx: AppContext,
}

#[derive(Clone, Serialize)]
struct PreferenceChangedPayload {
    key: String,
    value: Value,
}

fn emit_window(app: &AppHandle, event: &str, window: &WindowInstance) {
    events::emit(app, event, window);
}

fn emit_focus(app: &AppHandle, wm: &WindowManager) {
    events::emit(app, FOCUS_CHANGED, &wm.state().active_window_id());
}

fn emit_running_apps(app: &AppHandle, wm: &WindowManager) {
    events::emit(app, RUNNING_APPS_CHANGED, wm.state().running_apps());
}

fn play(app: &AppHandle, sound: SoundEvent, wm: &WindowManager) {
    if let Some(audio) = app.try_state::<AudioState>() {
        if let Ok(manager) = audio.0.lock() {
            manager.play(sound, wm.state().preferences());
        }
    }
}

/// Emit a focused-window update: the window itself plus the new focus.
fn publish_focus(app: &AppHandle, wm: &WindowManager, window: &WindowInstance) {
    emit_window(app, WINDOW_UPDATED, window);
    emit_focus(app, wm);
}

/// A window entered its closing transition. If it held focus, the window
/// that took over is pushed too.
fn publish_closing(app: &AppHandle, wm: &WindowManager, window: &WindowInstance, had_focus: bool) {
    emit_window(app, WINDOW_STATE_CHANGED, window);
    if had_focus {
        if let Some(active) = wm.get_active_window().filter(|w| w.id != window.id) {
            emit_window(app, WINDOW_UPDATED, &active);
        }
        emit_focus(app, wm);
    }
    play(app, SoundEvent::Close, wm);
}

// ===== Applications =====

#[tauri::command]
fn list_apps(desktop: State<DesktopState>) -> Vec<&'static str> {
    desktop.apps.names()
}

#[tauri::command]
fn open_app(name: String, app: AppHandle, desktop: State<DesktopState>) -> Result<Launch, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let launch = desktop
        .apps
        .open(&name, &mut wm, &desktop.ctx)
        .map_err(|e| {
            play(&app, SoundEvent::Error, &wm);
            e.to_string()
        })?;

    match &launch {
        Launch::Created(window) => {
            emit_window(&app, WINDOW_CREATED, window);
            emit_focus(&app, &wm);
            emit_running_apps(&app, &wm);
            play(&app, SoundEvent::Open, &wm);
        }
        Launch::Focused(window) => publish_focus(&app, &wm, window),
    }
    Ok(launch)
}

#[tauri::command]
fn close_app(name: String, app: AppHandle, desktop: State<DesktopState>) -> Result<usize, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let closed = desktop
        .apps
        .close(&name, &mut wm)
        .map_err(|e| e.to_string())?;

    for c in &closed {
        events::emit(&app, WINDOW_CLOSED, &c.window.id);
        if let Some(window) = &c.refocused {
            emit_window(&app, WINDOW_UPDATED, window);
        }
    }
    if !closed.is_empty() {
        emit_focus(&app, &wm);
        emit_running_apps(&app, &wm);
        play(&app, SoundEvent::Close, &wm);
    }
    Ok(closed.len())
}

// ===== Window Management Commands =====

#[tauri::command]
fn create_window(
    app_name: String,
    title: String,
    content_key: Option<String>,
    options: Option<WindowOptions>,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<WindowInstance, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let content_key = content_key.unwrap_or_else(|| app_name.clone());
    let window = wm.create_window(&app_name, &title, &content_key, options.unwrap_or_default());

    emit_window(&app, WINDOW_CREATED, &window);
    emit_focus(&app, &wm);
    emit_running_apps(&app, &wm);
    play(&app, SoundEvent::Open, &wm);
    Ok(window)
}

#[tauri::command]
fn focus_window(
    id: String,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.focus_window(&id);
    if let Some(window) = &window {
        publish_focus(&app, &wm, window);
    }
    Ok(window)
}

/// First phase of closing: cleanup runs now, the frontend animates and
/// then calls `remove_window`.
#[tauri::command]
fn close_window(
    id: String,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let had_focus = wm.state().active_window_id() == Some(id.as_str());
    let window = wm.begin_close(&id);
    if let Some(window) = &window {
        publish_closing(&app, &wm, window, had_focus);
    }
    Ok(window)
}

#[tauri::command]
fn remove_window(id: String, app: AppHandle, desktop: State<DesktopState>) -> Result<bool, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let Some(closed) = wm.finish_close(&id) else {
        return Ok(false);
    };

    events::emit(&app, WINDOW_CLOSED, &closed.window.id);
    if let Some(window) = &closed.refocused {
        emit_window(&app, WINDOW_UPDATED, window);
    }
    emit_focus(&app, &wm);
    if closed.app_released {
        emit_running_apps(&app, &wm);
    }
    Ok(true)
}

#[tauri::command]
fn minimize_window(
    id: String,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.minimize_window(&id);
    if let Some(window) = &window {
        emit_window(&app, WINDOW_UPDATED, window);
        play(&app, SoundEvent::Minimize, &wm);
    }
    Ok(window)
}

#[tauri::command]
fn restore_window(
    id: String,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.restore_window(&id);
    if let Some(window) = &window {
        publish_focus(&app, &wm, window);
    }
    Ok(window)
}

#[tauri::command]
fn toggle_maximize(
    id: String,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.toggle_maximize(&id);
    if let Some(window) = &window {
        publish_focus(&app, &wm, window);
        play(&app, SoundEvent::Maximize, &wm);
    }
    Ok(window)
}

#[tauri::command]
fn get_window(id: String, desktop: State<DesktopState>) -> Result<Option<WindowInstance>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.state().get_window(&id).cloned())
}

#[tauri::command]
fn get_window_by_app(
    app_name: String,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.get_window_by_app(&app_name))
}

/// Every open window, back to front
#[tauri::command]
fn get_all_windows(desktop: State<DesktopState>) -> Result<Vec<WindowInstance>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.stacking_order())
}

#[tauri::command]
fn get_active_window(desktop: State<DesktopState>) -> Result<Option<WindowInstance>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.get_active_window())
}

#[tauri::command]
fn get_running_apps(desktop: State<DesktopState>) -> Result<Vec<String>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.state().running_apps().iter().cloned().collect())
}

/// Dock indicator for a single app
#[tauri::command]
fn is_app_running(app_name: String, desktop: State<DesktopState>) -> Result<bool, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.state().is_running(&app_name))
}

#[tauri::command]
fn window_is_foreground(id: String, desktop: State<DesktopState>) -> Result<bool, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.is_foreground(&id))
}

#[tauri::command]
fn set_viewport(
    width: f64,
    height: f64,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<(), String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    for window in wm.set_viewport(Viewport { width, height }) {
        emit_window(&app, WINDOW_UPDATED, &window);
    }
    Ok(())
}

// ===== Pointer Gestures =====

#[tauri::command]
fn begin_drag(
    id: String,
    x: f64,
    y: f64,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<WindowInstance, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.begin_drag(&id, Point::new(x, y)).map_err(|e| e.to_string())?;
    publish_focus(&app, &wm, &window);
    Ok(window)
}

#[tauri::command]
fn begin_resize(
    id: String,
    handle: ResizeHandle,
    x: f64,
    y: f64,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<WindowInstance, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm
        .begin_resize(&id, handle, Point::new(x, y))
        .map_err(|e| e.to_string())?;
    publish_focus(&app, &wm, &window);
    Ok(window)
}

#[tauri::command]
fn pointer_move(
    x: f64,
    y: f64,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    let window = wm.pointer_move(Point::new(x, y));
    if let Some(window) = &window {
        emit_window(&app, WINDOW_UPDATED, window);
    }
    Ok(window)
}

#[tauri::command]
fn pointer_up(desktop: State<DesktopState>) -> Result<Option<WindowInstance>, String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.pointer_up())
}

// ===== Preferences =====

#[tauri::command]
fn get_preference(key: String, desktop: State<DesktopState>) -> Result<Option<Value>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.state().get_preference(&key).cloned())
}

#[tauri::command]
fn get_preferences(desktop: State<DesktopState>) -> Result<serde_json::Map<String, Value>, String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    Ok(wm.state().preferences().all().clone())
}

#[tauri::command]
fn set_preference(
    key: String,
    value: Value,
    app: AppHandle,
    desktop: State<DesktopState>,
) -> Result<(), String> {
    let mut wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    wm.state_mut()
        .set_preference(&key, value.clone())
        .map_err(|e| e.to_string())?;
    events::emit(&app, PREFERENCE_CHANGED, &PreferenceChangedPayload { key, value });
    Ok(())
}

// ===== Virtual Filesystem Commands =====

#[tauri::command]
async fn vfs_create_file(path: String, content: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.create_file(&path, &content).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_create_directory(path: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.create_directory(&path).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_read_file(path: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.read_file(&path).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_update_file(path: String, content: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.update_file(&path, &content).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_delete_file(path: String, vfs: State<'_, VirtualFs>) -> Result<usize, String> {
    vfs.delete_file(&path).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_list_directory(path: String, vfs: State<'_, VirtualFs>) -> Result<Vec<FileRecord>, String> {
    vfs.list_directory(&path).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_move_file(from: String, to: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.move_file(&from, &to).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_copy_file(from: String, to: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.copy_file(&from, &to).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_rename_file(path: String, new_name: String, vfs: State<'_, VirtualFs>) -> Result<FileRecord, String> {
    vfs.rename_file(&path, &new_name).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn vfs_search_files(query: String, vfs: State<'_, VirtualFs>) -> Result<Vec<FileRecord>, String> {
    Ok(vfs.search_files(&query).await)
}

// ===== PTY Terminal Commands =====
// Sessions are spawned by the terminal app and keyed by its window id.

#[tauri::command]
fn pty_write(session_id: String, data: String, state: State<PtyState>) -> Result<(), String> {
    let manager = state.0.lock().map_err(|e| e.to_string())?;
    manager
        .write(&session_id, data.as_bytes())
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn pty_read(session_id: String, state: State<PtyState>) -> Result<String, String> {
    // Polled frequently; not logged
    let manager = state.0.lock().map_err(|e| e.to_string())?;
    let bytes = manager.read(&session_id).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| format!("UTF-8 decode error: {}", e))
}

#[tauri::command]
fn pty_resize(session_id: String, rows: u16, cols: u16, state: State<PtyState>) -> Result<(), String> {
    let manager = state.0.lock().map_err(|e| e.to_string())?;
    manager
        .resize(&session_id, rows, cols)
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn get_terminal_banner(session_id: String) -> String {
    pty::welcome_banner(&session_id)
}

// ===== Sound and Wallpaper =====

#[tauri::command]
fn play_sound(sound: SoundEvent, app: AppHandle, desktop: State<DesktopState>) -> Result<(), String> {
    let wm = desktop.wm.lock().map_err(|e| e.to_string())?;
    play(&app, sound, &wm);
    Ok(())
}

#[tauri::command]
async fn load_wallpaper(url: String, cache: State<'_, WallpaperCache>) -> Result<CachedWallpaper, String> {
    cache.fetch(&url).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn clear_wallpaper_cache(cache: State<'_, WallpaperCache>) -> Result<(), String> {
    cache.clear().await.map_err(|e| e.to_string())
}

// ===== Keyboard Shortcuts =====

fn handle_shortcut(app: &AppHandle, action: shortcuts::ShortcutAction) {
    let Some(desktop) = app.try_state::<DesktopState>() else {
        return;
    };
    let Ok(mut wm) = desktop.wm.lock() else {
        return;
    };

    match shortcuts::apply(&mut wm, action) {
        Some(ShortcutOutcome::Closing(window)) => publish_closing(app, &wm, &window, true),
        Some(ShortcutOutcome::Updated(window)) => {
            emit_window(app, WINDOW_UPDATED, &window);
            emit_focus(app, &wm);
        }
        None => {}
    }
}

/// Register/Unregister the desktop shortcuts. The frontend enables them on
/// focus and disables them on blur so other programs keep their keys.
#[tauri::command]
fn set_global_shortcuts_enabled(app: AppHandle, enabled: bool) -> Result<(), String> {
    if enabled {
        let _ = app.global_shortcut().unregister_all();
        let mut registered = 0;
        let mut last_error = None;
        for (shortcut, _) in shortcuts::default_bindings() {
            match app.global_shortcut().register(shortcut) {
                Ok(()) => registered += 1,
                Err(e) => {
                    warn!(error = %e, "failed to register shortcut");
                    last_error = Some(e);
                }
            }
        }
        match (registered, last_error) {
            (0, Some(e)) => Err(format!("Failed to register any shortcuts: {}", e)),
            _ => {
                info!(registered, "global shortcuts enabled");
                Ok(())
            }
        }
    } else {
        info!("global shortcuts disabled");
        app.global_shortcut()
            .unregister_all()
            .map_err(|e| format!("Failed to unregister shortcuts: {}", e))
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // We must keep _stream alive, even though we don't use it directly, else audio stops.
    let (_stream, output_handle) = match audio::open_output() {
        Ok((stream, handle)) => (Some(stream), Some(handle)),
        Err(e) => {
            warn!(error = %e, "audio disabled");
            (None, None)
        }
    };

    let pty = PtyState(Arc::new(Mutex::new(PtyManager::new())));
    let pty_for_setup = pty.clone();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    // Only process on key press, not release
                    if event.state != ShortcutState::Pressed {
                        return;
                    }
                    if let Some(action) = shortcuts::action_for(shortcut) {
                        handle_shortcut(app, action);
                    }
                })
                .build(),
        )
        .manage(pty)
        .setup(move |app| {
            let config_dir = app.path().app_config_dir()?;
            let data_dir = app.path().app_data_dir()?;

            let config = DesktopConfig::load(&config_dir.join("desktop.json"));
            let preferences = PreferenceStore::load(data_dir.join("preferences.json"));

            let sounds = SoundManager::new(
                output_handle.map(|h| AudioSystem::new(h, &PathBuf::from(&config.sounds.directory))),
            );
            app.manage(AudioState(Arc::new(Mutex::new(sounds))));

            let vfs = tauri::async_runtime::block_on(VirtualFs::open(data_dir.join("vfs.json")))?;
            app.manage(vfs);
            app.manage(WallpaperCache::new(data_dir.join("wallpapers")));

            // Timers owned by windows run on Tauri's tokio runtime
            let runtime = tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });
            let wm = WindowManager::new(config.window_manager.clone(), preferences, runtime);

            let ctx = AppContext {
                events: Arc::new(app.handle().clone()),
                pty: pty_for_setup,
            };
            app.manage(DesktopState {
                wm: Arc::new(Mutex::new(wm)),
                apps: AppRegistry::with_builtin(),
                ctx,
            });

            info!("desktop ready (shortcuts will register on window focus)");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Applications
            list_apps,
            open_app,
            close_app,
            // Window management
            create_window,
            focus_window,
            close_window,
            remove_window,
            minimize_window,
            restore_window,
            toggle_maximize,
            get_window,
            get_window_by_app,
            get_all_windows,
            get_active_window,
            get_running_apps,
            is_app_running,
            window_is_foreground,
            set_viewport,
            // Gestures
            begin_drag,
            begin_resize,
            pointer_move,
            pointer_up,
            // Preferences
            get_preference,
            get_preferences,
            set_preference,
            // Virtual filesystem
            vfs_create_file,
            vfs_create_directory,
            vfs_read_file,
            vfs_update_file,
            vfs_delete_file,
            vfs_list_directory,
            vfs_move_file,
            vfs_copy_file,
            vfs_rename_file,
            vfs_search_files,
            // PTY terminal
            pty_write,
            pty_read,
            pty_resize,
            get_terminal_banner,
            // Sound and wallpaper
            play_sound,
            load_wallpaper,
            clear_wallpaper_cache,
            set_global_shortcuts_enabled,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
