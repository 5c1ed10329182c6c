// Apps whose behaviour lives entirely in the frontend

use super::Application;
use crate::state::window::WindowOptions;

/// A window-only app: the frontend renders `name` as its content
#[derive(Debug, Clone, Copy)]
pub struct StaticApp {
    pub name: &'static str,
    pub title: &'static str,
    pub width: f64,
    pub height: f64,
    pub resizable: bool,
    pub maximizable: bool,
    pub single_instance: bool,
}

impl StaticApp {
    const fn window(name: &'static str, title: &'static str, width: f64, height: f64) -> Self {
        Self {
            name,
            title,
            width,
            height,
            resizable: true,
            maximizable: true,
            single_instance: true,
        }
    }

    const fn fixed(mut self) -> Self {
        self.resizable = false;
        self.maximizable = false;
        self
    }

    const fn multi_instance(mut self) -> Self {
        self.single_instance = false;
        self
    }
}

impl Application for StaticApp {
    fn name(&self) -> &'static str {
        self.name
    }

    fn title(&self) -> &'static str {
        self.title
    }

    fn window_options(&self) -> WindowOptions {
        WindowOptions {
            resizable: Some(self.resizable),
            maximizable: Some(self.maximizable),
            ..WindowOptions::sized(self.width, self.height)
        }
    }

    fn single_instance(&self) -> bool {
        self.single_instance
    }
}

pub fn catalog() -> [StaticApp; 7] {
    [
        StaticApp::window("finder", "Finder", 800.0, 500.0),
        StaticApp::window("textedit", "TextEdit", 600.0, 450.0).multi_instance(),
        StaticApp::window("calculator", "Calculator", 240.0, 380.0).fixed(),
        StaticApp::window("notes", "Notes", 520.0, 420.0),
        StaticApp::window("browser", "Browser", 960.0, 620.0),
        StaticApp::window("settings", "System Settings", 560.0, 440.0).fixed(),
        StaticApp::window("chip8", "CHIP-8", 660.0, 380.0).fixed(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_apps_are_not_resizable() {
        let calc = catalog()
            .into_iter()
            .find(|a| a.name == "calculator")
            .unwrap();
        let opts = calc.window_options();
        assert_eq!(opts.resizable, Some(false));
        assert_eq!(opts.maximizable, Some(false));
        assert_eq!(opts.width, Some(240.0));
    }
}
