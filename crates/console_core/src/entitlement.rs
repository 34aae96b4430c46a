use std::sync::Arc;

use shared::protocol::UNAUTHORIZED_PATH;
use tracing::{info, warn};

use crate::{error::ConsoleError, page::Page, ConsoleApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementDecision {
    Authorized,
    Denied,
}

/// Asks the console whether the current session may act.
///
/// Every call goes to the server; decisions are never cached.
#[derive(Clone)]
pub struct EntitlementGate {
    api: Arc<dyn ConsoleApi>,
}

impl EntitlementGate {
    pub fn new(api: Arc<dyn ConsoleApi>) -> Self {
        Self { api }
    }

    pub async fn check(&self) -> Result<EntitlementDecision, ConsoleError> {
        let response = self
            .api
            .fetch_entitlement()
            .await
            .map_err(|source| ConsoleError::EntitlementCheck { source })?;

        let decision = if response.is_entitled() {
            EntitlementDecision::Authorized
        } else {
            EntitlementDecision::Denied
        };
        info!(
            ?decision,
            server_error = response.error.as_deref(),
            "entitlement: decision"
        );
        Ok(decision)
    }

    /// Page guard: sends the page to the unauthorized view on denial.
    pub async fn enforce(&self, page: &dyn Page) -> Result<EntitlementDecision, ConsoleError> {
        let decision = self.check().await?;
        if decision == EntitlementDecision::Denied {
            warn!("entitlement: denied, redirecting to {UNAUTHORIZED_PATH}");
            page.navigate(UNAUTHORIZED_PATH);
        }
        Ok(decision)
    }
}

#[cfg(test)]
#[path = "tests/entitlement_tests.rs"]
mod tests;
