// Cancellable resources owned by a window and released when it closes

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

type CloseHook = Box<dyn FnOnce() + Send + 'static>;

/// Timers and teardown hooks acquired by an app for one window.
/// `release` (or dropping the scope) cancels every timer and runs every hook once.
pub struct WindowResources {
    window_id: String,
    runtime: Handle,
    tasks: Vec<JoinHandle<()>>,
    hooks: Vec<CloseHook>,
}

impl WindowResources {
    pub fn new(window_id: String, runtime: Handle) -> Self {
        Self {
            window_id,
            runtime,
            tasks: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Run `tick` every `period`, first firing one period from now.
    pub fn interval<F>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval yields immediately on the first tick
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tick();
            }
        });
        self.tasks.push(task);
    }

    /// Run `fire` once after `delay` unless the window closes first.
    pub fn timeout<F>(&mut self, delay: Duration, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire();
        });
        self.tasks.push(task);
    }

    /// App-specific teardown run when the window closes.
    pub fn on_close<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Cancel all timers, then run the hooks in registration order.
    pub fn release(&mut self) {
        if self.tasks.is_empty() && self.hooks.is_empty() {
            return;
        }
        debug!(
            window = %self.window_id,
            timers = self.tasks.len(),
            hooks = self.hooks.len(),
            "releasing window resources"
        );
        for task in self.tasks.drain(..) {
            task.abort();
        }
        for hook in self.hooks.drain(..) {
            hook();
        }
    }
}

impl Drop for WindowResources {
    fn drop(&mut self) {
        self.release();
    }
}
