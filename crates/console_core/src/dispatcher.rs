use std::{sync::Arc, time::Duration};

use shared::{
    domain::DispatchId,
    protocol::{CommandRequest, HOME_PATH, POST_DISPATCH_REDIRECT_DELAY, UNAUTHORIZED_PATH},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    entitlement::{EntitlementDecision, EntitlementGate},
    error::ConsoleError,
    page::Page,
    ConsoleApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Submission launched and the home redirect scheduled.
    Sent(DispatchId),
    /// Page sent to the unauthorized view; nothing was submitted.
    Denied,
}

/// Sends operator commands to a cluster, one entitlement check per command.
///
/// The submission is fire-and-forget: its result is never read and a failed
/// POST still ends with the redirect home. Repeated dispatches are not
/// deduplicated, but only the most recent home redirect stays pending.
pub struct CommandDispatcher {
    gate: EntitlementGate,
    api: Arc<dyn ConsoleApi>,
    page: Arc<dyn Page>,
    redirect_delay: Duration,
    pending_redirect: Mutex<Option<JoinHandle<()>>>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn ConsoleApi>, page: Arc<dyn Page>) -> Self {
        Self {
            gate: EntitlementGate::new(Arc::clone(&api)),
            api,
            page,
            redirect_delay: POST_DISPATCH_REDIRECT_DELAY,
            pending_redirect: Mutex::new(None),
        }
    }

    pub fn with_redirect_delay(mut self, redirect_delay: Duration) -> Self {
        self.redirect_delay = redirect_delay;
        self
    }

    pub fn redirect_delay(&self) -> Duration {
        self.redirect_delay
    }

    pub async fn dispatch(
        &self,
        target: &str,
        command: &str,
    ) -> Result<DispatchOutcome, ConsoleError> {
        if self.gate.check().await? == EntitlementDecision::Denied {
            warn!(
                cluster = target,
                command, "dispatch: not entitled, redirecting to {UNAUTHORIZED_PATH}"
            );
            self.page.navigate(UNAUTHORIZED_PATH);
            return Ok(DispatchOutcome::Denied);
        }

        let dispatch_id = DispatchId::new();
        let request = CommandRequest::new(target, command);
        info!(%dispatch_id, cluster = target, command, "dispatch: submitting command");

        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            match api.submit_command(&request).await {
                Ok(()) => debug!(%dispatch_id, "dispatch: submission completed"),
                Err(error) => warn!(%dispatch_id, %error, "dispatch: submission failed"),
            }
        });

        self.schedule_home_redirect(dispatch_id).await;
        Ok(DispatchOutcome::Sent(dispatch_id))
    }

    pub async fn has_pending_redirect(&self) -> bool {
        self.pending_redirect
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    async fn schedule_home_redirect(&self, dispatch_id: DispatchId) {
        let mut pending = self.pending_redirect.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let page = Arc::clone(&self.page);
        let delay = self.redirect_delay;
        debug!(%dispatch_id, ?delay, "dispatch: home redirect armed");
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            page.navigate(HOME_PATH);
        }));
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
