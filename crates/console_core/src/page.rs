//! The browser tab the controllers run in.
//!
//! [`Page`] is the seam between the controllers and whatever hosts them: a
//! real browser binding, or [`HeadlessPage`] for the CLI and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use crate::error::ConsoleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Full navigation that added a history entry.
    Navigated(Url),
    /// Location replaced in place; no history entry.
    Replaced(Url),
    Reloaded(Url),
}

pub trait Page: Send + Sync {
    fn location(&self) -> Url;

    /// Fragment without the leading `#`.
    fn fragment(&self) -> Option<String> {
        self.location().fragment().map(str::to_string)
    }

    fn navigate(&self, path: &str);
    fn replace(&self, target: &str);
    fn reload(&self);
    fn set_autoreload_checked(&self, checked: bool);
    fn autoreload_checked(&self) -> bool;
}

struct HeadlessState {
    history: Vec<Url>,
    autoreload_checked: bool,
    reloads: usize,
}

impl HeadlessState {
    fn location(&self) -> &Url {
        // `history` is seeded on open and only ever grows.
        &self.history[self.history.len() - 1]
    }
}

pub struct HeadlessPage {
    state: Mutex<HeadlessState>,
    events: broadcast::Sender<PageEvent>,
}

impl HeadlessPage {
    pub fn open(url: &str) -> Result<Self, ConsoleError> {
        let location = Url::parse(url).map_err(|source| ConsoleError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::at(location))
    }

    pub fn at(location: Url) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(HeadlessState {
                history: vec![location],
                autoreload_checked: false,
                reloads: 0,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    pub fn history(&self) -> Vec<Url> {
        self.state().history.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.state().reloads
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, target: &str) -> Option<Url> {
        let current = self.location();
        match current.join(target) {
            Ok(url) => Some(url),
            Err(error) => {
                warn!(%current, target, %error, "page: cannot resolve navigation target");
                None
            }
        }
    }
}

impl Page for HeadlessPage {
    fn location(&self) -> Url {
        self.state().location().clone()
    }

    fn navigate(&self, path: &str) {
        let Some(url) = self.resolve(path) else {
            return;
        };
        {
            let mut state = self.state();
            state.history.push(url.clone());
            state.autoreload_checked = false;
        }
        info!(%url, "page: navigated");
        let _ = self.events.send(PageEvent::Navigated(url));
    }

    fn replace(&self, target: &str) {
        let Some(url) = self.resolve(target) else {
            return;
        };
        {
            let mut state = self.state();
            if let Some(current) = state.history.last_mut() {
                *current = url.clone();
            }
        }
        info!(%url, "page: location replaced");
        let _ = self.events.send(PageEvent::Replaced(url));
    }

    fn reload(&self) {
        let url = {
            let mut state = self.state();
            state.reloads += 1;
            state.autoreload_checked = false;
            state.location().clone()
        };
        info!(%url, "page: reloaded");
        let _ = self.events.send(PageEvent::Reloaded(url));
    }

    fn set_autoreload_checked(&self, checked: bool) {
        self.state().autoreload_checked = checked;
    }

    fn autoreload_checked(&self) -> bool {
        self.state().autoreload_checked
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
