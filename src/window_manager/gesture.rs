// Pointer gesture slot shared by every window: at most one drag or resize at a time

use super::geometry::{Point, ResizeHandle};
use crate::state::window::Bounds;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GestureError {
    #[error("window {0} not found")]
    WindowNotFound(String),
    #[error("window {0} is maximized")]
    Maximized(String),
    #[error("window {0} is not resizable")]
    NotResizable(String),
    #[error("window {0} is minimized")]
    Minimized(String),
    #[error("a {kind} gesture on window {window} is already in progress")]
    Busy { window: String, kind: &'static str },
}

/// Bookkeeping captured on pointer-down and discarded on pointer-up
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Gesture {
    Idle,
    Dragging {
        window: String,
        start_pointer: Point,
        start_bounds: Bounds,
    },
    Resizing {
        window: String,
        handle: ResizeHandle,
        start_pointer: Point,
        start_bounds: Bounds,
    },
}

impl Gesture {
    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn window(&self) -> Option<&str> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { window, .. } | Gesture::Resizing { window, .. } => Some(window),
        }
    }

    /// Error describing why a new gesture cannot start, if one is in flight.
    pub fn busy(&self) -> Option<GestureError> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { window, .. } => Some(GestureError::Busy {
                window: window.clone(),
                kind: "drag",
            }),
            Gesture::Resizing { window, .. } => Some(GestureError::Busy {
                window: window.clone(),
                kind: "resize",
            }),
        }
    }

    /// Pointer delta since the gesture started.
    pub fn delta(&self, pointer: Point) -> Option<(f64, f64)> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging { start_pointer, .. } | Gesture::Resizing { start_pointer, .. } => {
                Some((pointer.x - start_pointer.x, pointer.y - start_pointer.y))
            }
        }
    }
}

impl Default for Gesture {
    fn default() -> Self {
        Gesture::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_not_busy() {
        assert!(Gesture::Idle.busy().is_none());
        assert!(Gesture::Idle.delta(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn delta_is_relative_to_start() {
        let g = Gesture::Resizing {
            window: "w".into(),
            handle: ResizeHandle::Se,
            start_pointer: Point::new(10.0, 20.0),
            start_bounds: Bounds::new(0.0, 0.0, 300.0, 200.0),
        };
        assert_eq!(g.delta(Point::new(15.0, 5.0)), Some((5.0, -15.0)));
        assert_eq!(
            g.busy(),
            Some(GestureError::Busy {
                window: "w".into(),
                kind: "resize"
            })
        );
    }
}
