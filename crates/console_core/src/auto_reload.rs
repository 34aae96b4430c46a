//! Auto-refresh of the console view.
//!
//! The only persisted state is the `#autoreload` fragment. Each page load
//! reads it back, so an armed timer that fires reloads the page into `On`
//! again until the operator switches the toggle off.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::ReloadState,
    protocol::{AUTORELOAD_FRAGMENT, AUTORELOAD_INTERVAL, HOME_PATH},
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::page::Page;

/// Owns the page's single reload timer.
///
/// Timer operations spawn onto the current Tokio runtime, so every method
/// that can arm must be called from inside one.
pub struct AutoReloadController {
    page: Arc<dyn Page>,
    interval: Duration,
    state: ReloadState,
    timer: Option<JoinHandle<()>>,
}

impl AutoReloadController {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self {
            page,
            interval: AUTORELOAD_INTERVAL,
            state: ReloadState::Off,
            timer: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Restores `On` from the fragment without touching the URL.
    pub fn on_page_load(&mut self) -> ReloadState {
        if self.page.fragment().as_deref() == Some(AUTORELOAD_FRAGMENT) {
            self.arm();
            self.page.set_autoreload_checked(true);
            self.state = ReloadState::On;
            info!(interval = ?self.interval, "auto-reload: restored from fragment");
        }
        self.state
    }

    pub fn toggle(&mut self, checked: bool) -> ReloadState {
        if checked {
            self.page.replace(&format!("#{AUTORELOAD_FRAGMENT}"));
            self.arm();
            self.state = ReloadState::On;
        } else {
            self.page.replace(HOME_PATH);
            self.cancel();
            self.state = ReloadState::Off;
        }
        info!(state = %self.state, "auto-reload: toggled");
        self.state
    }

    fn arm(&mut self) {
        self.cancel();
        let page = Arc::clone(&self.page);
        let interval = self.interval;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            page.reload();
        }));
        debug!(?interval, "auto-reload: timer armed");
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug!("auto-reload: timer cancelled");
        }
    }
}

impl Drop for AutoReloadController {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/auto_reload_tests.rs"]
mod tests;
