use super::{AppContext, Application};
use crate::events::{self, EventSink, PET_UPDATED};
use crate::state::window::{WindowInstance, WindowOptions};
use crate::window_manager::WindowManager;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PetStats {
    pub hunger: u8,
    pub happiness: u8,
    pub energy: u8,
}

impl Default for PetStats {
    fn default() -> Self {
        Self {
            hunger: 0,
            happiness: 100,
            energy: 100,
        }
    }
}

impl PetStats {
    /// One simulation step
    pub fn decay(&mut self) {
        self.hunger = self.hunger.saturating_add(2).min(100);
        self.happiness = self.happiness.saturating_sub(1);
        self.energy = self.energy.saturating_sub(1);
    }
}

#[derive(Serialize)]
struct PetUpdate<'a> {
    window_id: &'a str,
    stats: PetStats,
}

/// Desktop pet whose stats decay on a timer owned by its window
pub struct Pet {
    pub tick: Duration,
}

impl Default for Pet {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(5),
        }
    }
}

impl Application for Pet {
    fn name(&self) -> &'static str {
        "pet"
    }

    fn title(&self) -> &'static str {
        "Pet"
    }

    fn window_options(&self) -> WindowOptions {
        WindowOptions::sized(260.0, 300.0).fixed_size()
    }

    fn attach(
        &self,
        window: &WindowInstance,
        wm: &mut WindowManager,
        ctx: &AppContext,
    ) -> Result<(), String> {
        let stats = Arc::new(Mutex::new(PetStats::default()));
        let resources = wm
            .resources(&window.id)
            .ok_or_else(|| format!("window {} has no resource scope", window.id))?;

        // Starting stats once the frontend has mounted the window
        let sink = ctx.events.clone();
        let window_id = window.id.clone();
        resources.timeout(Duration::ZERO, move || {
            publish(sink.as_ref(), &window_id, PetStats::default());
        });

        let sink = ctx.events.clone();
        let window_id = window.id.clone();
        resources.interval(self.tick, move || {
            let Ok(mut stats) = stats.lock() else {
                return;
            };
            stats.decay();
            publish(sink.as_ref(), &window_id, *stats);
        });
        Ok(())
    }
}

fn publish(sink: &dyn EventSink, window_id: &str, stats: PetStats) {
    events::emit(sink, PET_UPDATED, &PetUpdate { window_id, stats });
}
