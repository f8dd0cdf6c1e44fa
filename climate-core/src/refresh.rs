//! Periodic background refresh of the active location.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// A repeating timer task. Dropping it stops the task.
#[derive(Debug, Default)]
pub struct RefreshTimer {
    task: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    /// Call `on_tick` every `every`, first after one full interval.
    /// The timer stops itself once `on_tick` returns `false`.
    pub fn start<F>(every: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick() {
                    debug!("refresh timer receiver gone, stopping");
                    break;
                }
            }
        });

        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the timer. Stopping an idle timer does nothing.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
