use serde::{Deserialize, Serialize};

/// Window geometry in CSS pixels relative to the desktop viewport.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Options recognized by `create_window`. Every field is optional;
/// missing values fall back to the window manager defaults.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
#[serde(default)]
pub struct WindowOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub resizable: Option<bool>,
    pub minimizable: Option<bool>,
    pub maximizable: Option<bool>,
}

impl WindowOptions {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = Some(left);
        self.top = Some(top);
        self
    }

    pub fn fixed_size(mut self) -> Self {
        self.resizable = Some(false);
        self.maximizable = Some(false);
        self
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct WindowInstance {
    pub id: String,              // "<app>-<millis>-<suffix>"
    pub app_name: String,        // Owning application (e.g. "notes")
    pub title: String,           // Title bar text
    pub content_key: String,     // What the frontend renders inside the window
    pub bounds: Bounds,
    pub z_index: u32,
    pub is_maximized: bool,
    pub is_minimized: bool,
    pub is_closing: bool,
    /// Geometry to restore when leaving the maximized state
    pub original_bounds: Option<Bounds>,
    pub resizable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
}
