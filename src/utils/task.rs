//! Timers owned by a view. Dropping the handle stops the timer, so a view that
//! goes away cannot leave one running.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Runs `tick` every `period`, first after one full period.
pub struct RepeatingTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            // A slow tick delays the next one instead of firing a burst
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                tick().await;
            }
        });

        debug!("Started repeating task {} every {:?}", name, period);
        Self { name, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Stopped repeating task {}", self.name);
    }
}

/// Runs a future once after `delay` unless cancelled first.
pub struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    pub fn spawn<Fut>(delay: Duration, task: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
