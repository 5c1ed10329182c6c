// Geometry rules for placing, dragging and resizing windows

use crate::config::WmConfig;
use crate::state::window::{Bounds, WindowOptions};
use serde::{Deserialize, Serialize};

/// Size of the desktop area as reported by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Pointer position in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The eight grab regions along a window's edges and corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    #[cfg(test)]
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::S,
        ResizeHandle::E,
        ResizeHandle::W,
        ResizeHandle::Ne,
        ResizeHandle::Nw,
        ResizeHandle::Se,
        ResizeHandle::Sw,
    ];

    fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }
}

/// Area a maximized window fills: the viewport minus the menu bar.
pub fn workspace(config: &WmConfig, viewport: Viewport) -> Bounds {
    Bounds::new(
        0.0,
        config.menu_bar_height,
        viewport.width,
        (viewport.height - config.menu_bar_height).max(config.min_height),
    )
}

/// Placement for a new window. With neither `left` nor `top` the window is
/// centered in the workspace, shifted by `cascade_step` per window already
/// open; if only one is given the other takes `default_offset`.
pub fn initial_bounds(
    config: &WmConfig,
    viewport: Viewport,
    options: &WindowOptions,
    open_windows: usize,
) -> Bounds {
    let width = options
        .width
        .unwrap_or(config.default_width)
        .max(config.min_width);
    let height = options
        .height
        .unwrap_or(config.default_height)
        .max(config.min_height);

    let (left, top) = match (options.left, options.top) {
        (None, None) => {
            let area = workspace(config, viewport);
            let shift = config.cascade_step * (open_windows % 10) as f64;
            let left = ((area.width - width) / 2.0).max(0.0) + shift;
            let top = area.top + ((area.height - height) / 2.0).max(0.0) + shift;
            (left, top)
        }
        (left, top) => (
            left.unwrap_or(config.default_offset),
            top.unwrap_or(config.default_offset),
        ),
    };

    Bounds::new(left, top, width, height)
}

/// Position after dragging by (`dx`, `dy`) from `start`: edges within
/// `snap_threshold` dock to the viewport, then the title bar is kept on screen.
pub fn drag_to(config: &WmConfig, viewport: Viewport, start: Bounds, dx: f64, dy: f64) -> Bounds {
    let mut left = start.left + dx;
    let mut top = start.top + dy;
    let threshold = config.snap_threshold;

    if left.abs() <= threshold {
        left = 0.0;
    } else if (viewport.width - (left + start.width)).abs() <= threshold {
        left = viewport.width - start.width;
    }

    if (top - config.menu_bar_height).abs() <= threshold {
        top = config.menu_bar_height;
    } else if (viewport.height - (top + start.height)).abs() <= threshold {
        top = viewport.height - start.height;
    }

    let max_left = (viewport.width - start.width).max(0.0);
    let max_top = (viewport.height - config.title_bar_height).max(config.menu_bar_height);

    Bounds::new(
        left.clamp(0.0, max_left),
        top.clamp(config.menu_bar_height, max_top),
        start.width,
        start.height,
    )
}

/// Geometry after pulling `handle` by (`dx`, `dy`). Width and height never drop
/// below the configured minimum; north/west edges keep the opposite edge fixed
/// and stop at the menu bar and the left screen edge.
pub fn resize_to(config: &WmConfig, start: Bounds, handle: ResizeHandle, dx: f64, dy: f64) -> Bounds {
    let mut next = start;

    if handle.moves_east() {
        next.width = (start.width + dx).max(config.min_width);
    }
    if handle.moves_west() {
        next.width = (start.width - dx).max(config.min_width);
        next.left = start.right() - next.width;
        if next.left < 0.0 {
            next.left = 0.0;
            next.width = start.right().max(config.min_width);
        }
    }
    if handle.moves_south() {
        next.height = (start.height + dy).max(config.min_height);
    }
    if handle.moves_north() {
        next.height = (start.height - dy).max(config.min_height);
        next.top = start.bottom() - next.height;
        if next.top < config.menu_bar_height {
            next.top = config.menu_bar_height;
            next.height = (start.bottom() - next.top).max(config.min_height);
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 1280.0,
        height: 800.0,
    };

    #[test]
    fn first_window_is_centered_in_workspace() {
        let config = WmConfig::default();
        let b = initial_bounds(&config, VIEW, &WindowOptions::sized(400.0, 300.0), 0);
        assert_eq!(b.left, 440.0);
        assert_eq!(b.top, 28.0 + (772.0 - 300.0) / 2.0);
    }

    #[test]
    fn later_windows_cascade() {
        let config = WmConfig::default();
        let first = initial_bounds(&config, VIEW, &WindowOptions::default(), 0);
        let second = initial_bounds(&config, VIEW, &WindowOptions::default(), 1);
        assert_eq!(second.left - first.left, config.cascade_step);
        assert_eq!(second.top - first.top, config.cascade_step);
    }

    #[test]
    fn partial_position_uses_fixed_offset() {
        let config = WmConfig::default();
        let opts = WindowOptions {
            left: Some(300.0),
            ..WindowOptions::default()
        };
        let b = initial_bounds(&config, VIEW, &opts, 0);
        assert_eq!((b.left, b.top), (300.0, config.default_offset));
    }

    #[test]
    fn undersized_options_are_floored() {
        let config = WmConfig::default();
        let b = initial_bounds(&config, VIEW, &WindowOptions::sized(-10.0, 5.0), 0);
        assert_eq!((b.width, b.height), (config.min_width, config.min_height));
    }

    #[test]
    fn drag_past_left_edge_is_clamped() {
        let config = WmConfig::default();
        let start = Bounds::new(50.0, 50.0, 400.0, 300.0);
        let b = drag_to(&config, VIEW, start, -550.0, 0.0);
        assert_eq!(b.left, 0.0);
    }

    #[test]
    fn drag_near_right_edge_snaps() {
        let config = WmConfig::default();
        let start = Bounds::new(800.0, 200.0, 400.0, 300.0);
        // 1280 - (870 + 400) = 10px gap, inside the threshold
        let b = drag_to(&config, VIEW, start, 70.0, 0.0);
        assert_eq!(b.left, VIEW.width - 400.0);
    }

    #[test]
    fn drag_near_left_edge_snaps() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 200.0, 400.0, 300.0);
        let b = drag_to(&config, VIEW, start, -85.0, 0.0);
        assert_eq!(b.left, 0.0);
    }

    #[test]
    fn drag_near_menu_bar_snaps_to_it() {
        let config = WmConfig::default();
        let start = Bounds::new(300.0, 200.0, 400.0, 300.0);
        // top lands at 40, 12px below the menu bar
        let b = drag_to(&config, VIEW, start, 0.0, -160.0);
        assert_eq!(b.top, config.menu_bar_height);
    }

    #[test]
    fn drag_near_bottom_edge_snaps() {
        let config = WmConfig::default();
        let start = Bounds::new(300.0, 200.0, 400.0, 300.0);
        // bottom lands at 790, 10px above the viewport edge
        let b = drag_to(&config, VIEW, start, 0.0, 290.0);
        assert_eq!(b.top, VIEW.height - 300.0);
        assert_eq!(b.bottom(), VIEW.height);
    }

    #[test]
    fn tall_window_bottom_snap_is_clamped_to_menu_bar() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 28.0, 400.0, 900.0);
        // bottom snap alone would put the title bar at -100
        let b = drag_to(&config, VIEW, start, 0.0, -120.0);
        assert_eq!(b.top, config.menu_bar_height);
    }

    #[test]
    fn drag_outside_threshold_does_not_snap() {
        let config = WmConfig::default();
        let start = Bounds::new(500.0, 300.0, 400.0, 300.0);
        let b = drag_to(&config, VIEW, start, 10.0, 10.0);
        assert_eq!((b.left, b.top), (510.0, 310.0));
    }

    #[test]
    fn drag_keeps_title_bar_below_menu_bar_and_on_screen() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        assert_eq!(drag_to(&config, VIEW, start, 0.0, -500.0).top, config.menu_bar_height);
        let low = drag_to(&config, VIEW, start, 0.0, 5000.0);
        assert_eq!(low.top, VIEW.height - config.title_bar_height);
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        for handle in ResizeHandle::ALL {
            let b = resize_to(&config, start, handle, -5000.0, -5000.0);
            assert!(b.width >= config.min_width, "{handle:?}");
            assert!(b.height >= config.min_height, "{handle:?}");
            let b = resize_to(&config, start, handle, 5000.0, 5000.0);
            assert!(b.width >= config.min_width, "{handle:?}");
            assert!(b.height >= config.min_height, "{handle:?}");
        }
    }

    #[test]
    fn east_handle_to_negative_width_yields_minimum() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        let b = resize_to(&config, start, ResizeHandle::E, -1000.0, 0.0);
        assert_eq!(b.width, config.min_width);
        assert_eq!(b.left, 100.0);
    }

    #[test]
    fn west_handle_keeps_right_edge_fixed() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        let b = resize_to(&config, start, ResizeHandle::W, 1000.0, 0.0);
        assert_eq!(b.width, config.min_width);
        assert_eq!(b.right(), start.right());
    }

    #[test]
    fn west_handle_stops_at_screen_edge() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        for handle in [ResizeHandle::W, ResizeHandle::Nw, ResizeHandle::Sw] {
            let b = resize_to(&config, start, handle, -500.0, 0.0);
            assert_eq!(b.left, 0.0, "{handle:?}");
            assert_eq!(b.right(), start.right(), "{handle:?}");
        }
    }

    #[test]
    fn north_handle_stops_at_menu_bar() {
        let config = WmConfig::default();
        let start = Bounds::new(100.0, 100.0, 400.0, 300.0);
        let b = resize_to(&config, start, ResizeHandle::Nw, 0.0, -500.0);
        assert_eq!(b.top, config.menu_bar_height);
        assert_eq!(b.bottom(), start.bottom());
    }
}
