use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{CommandRequest, EntitlementResponse};
use tokio::{sync::Mutex, time::Instant};

use crate::{page::HeadlessPage, ConsoleApi, ViewSnapshot};

pub(crate) const CONSOLE_URL: &str = "http://console.test/";

pub(crate) fn console_page(url: &str) -> Arc<HeadlessPage> {
    Arc::new(HeadlessPage::open(url).expect("page url"))
}

pub(crate) struct FakeConsoleApi {
    /// `None` simulates an unreachable entitlement endpoint.
    entitlement: Option<EntitlementResponse>,
    fail_submissions: bool,
    entitlement_checks: Arc<Mutex<u32>>,
    submissions: Arc<Mutex<Vec<(CommandRequest, Instant)>>>,
}

impl FakeConsoleApi {
    pub(crate) fn with_response(entitlement: EntitlementResponse) -> Self {
        Self {
            entitlement: Some(entitlement),
            fail_submissions: false,
            entitlement_checks: Arc::new(Mutex::new(0)),
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn entitled() -> Self {
        Self::with_response(EntitlementResponse::entitled())
    }

    pub(crate) fn not_entitled() -> Self {
        Self::with_response(EntitlementResponse::not_entitled())
    }

    pub(crate) fn unreachable() -> Self {
        let mut api = Self::entitled();
        api.entitlement = None;
        api
    }

    pub(crate) fn failing_submissions(mut self) -> Self {
        self.fail_submissions = true;
        self
    }

    pub(crate) async fn entitlement_checks(&self) -> u32 {
        *self.entitlement_checks.lock().await
    }

    pub(crate) async fn submissions(&self) -> Vec<CommandRequest> {
        self.submissions
            .lock()
            .await
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub(crate) async fn submission_times(&self) -> Vec<Instant> {
        self.submissions
            .lock()
            .await
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl ConsoleApi for FakeConsoleApi {
    async fn fetch_entitlement(&self) -> Result<EntitlementResponse> {
        *self.entitlement_checks.lock().await += 1;
        self.entitlement
            .clone()
            .ok_or_else(|| anyhow!("connection refused"))
    }

    async fn submit_command(&self, request: &CommandRequest) -> Result<()> {
        self.submissions
            .lock()
            .await
            .push((request.clone(), Instant::now()));
        if self.fail_submissions {
            return Err(anyhow!("502 bad gateway"));
        }
        Ok(())
    }

    async fn load_view(&self, _path: &str) -> Result<ViewSnapshot> {
        Ok(ViewSnapshot {
            status: 200,
            bytes: 0,
        })
    }
}
