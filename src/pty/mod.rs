use portable_pty::{native_pty_system, Child, CommandBuilder, PtyPair, PtySize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("failed to {action}: {reason}")]
    Backend { action: &'static str, reason: String },
    #[error("failed to lock {0}")]
    Poisoned(&'static str),
    #[error("pty io error: {0}")]
    Io(#[from] std::io::Error),
}

fn backend(action: &'static str, e: impl std::fmt::Display) -> PtyError {
    error!(action, error = %e, "pty backend failure");
    PtyError::Backend {
        action,
        reason: e.to_string(),
    }
}

/// Greeting printed at the top of every terminal window
pub fn welcome_banner(session_id: &str) -> String {
    let arch = std::env::consts::ARCH;
    let os = std::env::consts::OS;
    let session_hex: String = session_id
        .rsplit('-')
        .next()
        .unwrap_or(session_id)
        .chars()
        .take(6)
        .collect();

    format!(
        "foliodesk terminal  [{} / {}]  session 0x{}\r\nType `help` for portfolio commands.\r\n\r\n",
        os,
        arch,
        session_hex.to_uppercase()
    )
}

/// A shell attached to one terminal window
pub struct PtySession {
    pub pair: PtyPair,
    pub child: Box<dyn Child + Send + Sync>,
    pub writer: Arc<Mutex<Box<dyn Write + Send>>>,
    pub output_buffer: Arc<Mutex<Vec<u8>>>,
    pub is_alive: Arc<Mutex<bool>>,
}

/// Shells keyed by the id of the window that owns them
pub struct PtyManager {
    sessions: HashMap<String, PtySession>,
}

impl PtyManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Spawn a shell for `session_id`. Spawning an existing session is a no-op.
    pub fn spawn(&mut self, session_id: &str) -> Result<(), PtyError> {
        if self.sessions.contains_key(session_id) {
            debug!(session = session_id, "pty session already exists");
            return Ok(());
        }

        let pty_system = native_pty_system();

        // Default size; the frontend resizes once the window is laid out
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| backend("open pty", e))?;

        #[cfg(target_os = "windows")]
        let cmd = CommandBuilder::new("powershell.exe");

        #[cfg(not(target_os = "windows"))]
        let cmd = CommandBuilder::new("bash");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| backend("spawn shell", e))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| backend("clone pty reader", e))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| backend("take pty writer", e))?;

        let output_buffer = Arc::new(Mutex::new(Vec::new()));
        let is_alive = Arc::new(Mutex::new(true));

        let buffer_clone = Arc::clone(&output_buffer);
        let alive_clone = Arc::clone(&is_alive);
        let session_id_clone = session_id.to_string();

        thread::spawn(move || {
            let mut reader = reader;
            let mut buf = [0u8; 1024];

            loop {
                if let Ok(alive) = alive_clone.lock() {
                    if !*alive {
                        break;
                    }
                }

                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!(session = %session_id_clone, "pty reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if let Ok(mut buffer) = buffer_clone.lock() {
                            buffer.extend_from_slice(&buf[..n]);
                        }
                    }
                    Err(e) => {
                        if e.kind() != std::io::ErrorKind::WouldBlock {
                            warn!(session = %session_id_clone, error = %e, "pty read failed");
                            break;
                        }
                    }
                }

                // Small sleep to prevent busy-waiting
                thread::sleep(Duration::from_millis(10));
            }
            debug!(session = %session_id_clone, "pty reader exiting");
        });

        self.sessions.insert(
            session_id.to_string(),
            PtySession {
                pair,
                child,
                writer: Arc::new(Mutex::new(writer)),
                output_buffer,
                is_alive,
            },
        );

        info!(session = session_id, "pty session spawned");
        Ok(())
    }

    pub fn write(&self, session_id: &str, data: &[u8]) -> Result<(), PtyError> {
        let session = self.session(session_id)?;
        let mut writer = session
            .writer
            .lock()
            .map_err(|_| PtyError::Poisoned("pty writer"))?;
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    /// Drain whatever the shell has produced since the last read
    pub fn read(&self, session_id: &str) -> Result<Vec<u8>, PtyError> {
        let session = self.session(session_id)?;
        let mut buffer = session
            .output_buffer
            .lock()
            .map_err(|_| PtyError::Poisoned("pty output buffer"))?;
        Ok(std::mem::take(&mut *buffer))
    }

    pub fn resize(&self, session_id: &str, rows: u16, cols: u16) -> Result<(), PtyError> {
        let session = self.session(session_id)?;
        session
            .pair
            .master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| backend("resize pty", e))?;
        debug!(session = session_id, rows, cols, "pty resized");
        Ok(())
    }

    pub fn close(&mut self, session_id: &str) -> Result<(), PtyError> {
        let mut session = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| PtyError::NotFound(session_id.to_string()))?;

        if let Ok(mut alive) = session.is_alive.lock() {
            *alive = false;
        }

        // The process may already have exited
        if let Err(e) = session.child.kill() {
            debug!(session = session_id, error = %e, "kill failed");
        }
        let _ = session.child.wait();

        // Dropping the PtyPair crashes ConPTY cleanup on Windows
        #[cfg(target_os = "windows")]
        std::mem::forget(session.pair);

        info!(session = session_id, "pty session closed");
        Ok(())
    }

    #[allow(dead_code)]
    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    fn session(&self, session_id: &str) -> Result<&PtySession, PtyError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| PtyError::NotFound(session_id.to_string()))
    }
}

/// Tauri-managed handle shared with the terminal app's close hooks
#[derive(Clone)]
pub struct PtyState(pub Arc<Mutex<PtyManager>>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_uses_id_suffix() {
        let banner = welcome_banner("terminal-1700000000000-abcdef12");
        assert!(banner.contains("0xABCDEF"));
    }

    #[test]
    fn unknown_session_is_not_found() {
        let mut manager = PtyManager::new();
        assert!(matches!(manager.read("nope"), Err(PtyError::NotFound(_))));
        assert!(matches!(manager.close("nope"), Err(PtyError::NotFound(_))));
        assert!(!manager.has_session("nope"));
    }
}
