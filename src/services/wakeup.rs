//! Waits out a cold-starting backend: a fixed countdown, then health probes
//! until the server answers.

use crate::models::config::WakeUpConfig;
use crate::services::api::SharedApi;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{timeout, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeUpStatus {
    Counting { remaining_secs: u64 },
    Probing { attempt: u32 },
    Ready,
}

pub struct WakeUpMonitor {
    api: SharedApi,
    countdown: Duration,
    probe_timeout: Duration,
    retry_delay: Duration,
    started: Instant,
    status: watch::Sender<WakeUpStatus>,
}

impl WakeUpMonitor {
    pub fn new(api: SharedApi, config: &WakeUpConfig) -> Self {
        let (status, _) = watch::channel(WakeUpStatus::Counting {
            remaining_secs: config.countdown_secs,
        });
        Self {
            api,
            countdown: Duration::from_secs(config.countdown_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            started: Instant::now(),
            status,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WakeUpStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> WakeUpStatus {
        *self.status.borrow()
    }

    pub fn remaining(&self) -> Duration {
        self.countdown.saturating_sub(self.started.elapsed())
    }

    /// Countdown progress as a whole percentage.
    pub fn progress(&self) -> u8 {
        if self.countdown.is_zero() {
            return 100;
        }
        let elapsed = self.started.elapsed().min(self.countdown);
        (elapsed.as_millis() * 100 / self.countdown.as_millis()) as u8
    }

    /// Runs until the server answers. Returns the number of probes it took.
    pub async fn run(&self) -> u32 {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let remaining = self.remaining();
            if remaining.is_zero() {
                break;
            }
            self.status.send_replace(WakeUpStatus::Counting {
                remaining_secs: remaining.as_secs_f64().ceil() as u64,
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.status.send_replace(WakeUpStatus::Probing { attempt });
            if self.probe().await {
                info!("Server ready after {} probe(s)", attempt);
                self.status.send_replace(WakeUpStatus::Ready);
                return attempt;
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn probe(&self) -> bool {
        match timeout(self.probe_timeout, self.api.health()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("Health probe failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Health probe timed out after {:?}", self.probe_timeout);
                false
            }
        }
    }
}
