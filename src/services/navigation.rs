use crate::models::Route;
use crate::utils::task::DelayedTask;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// Publishes where the user should be taken next. Views call it, the front end follows it.
#[derive(Clone)]
pub struct Navigator {
    target: Arc<watch::Sender<Option<Route>>>,
}

impl Default for Navigator {
    fn default() -> Self {
        let (tx, _) = watch::channel(None);
        Self { target: Arc::new(tx) }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigate(&self, route: Route) {
        info!("Navigating to {:?}", route);
        self.target.send_replace(Some(route));
    }

    /// Navigates after `delay`; dropping the returned task cancels it.
    pub fn navigate_after(&self, route: Route, delay: Duration) -> DelayedTask {
        let navigator = self.clone();
        DelayedTask::spawn(delay, async move {
            navigator.navigate(route);
        })
    }

    pub fn current(&self) -> Option<Route> {
        *self.target.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Route>> {
        self.target.subscribe()
    }
}
