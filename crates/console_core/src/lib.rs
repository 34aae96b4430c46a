use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use shared::protocol::{
    CommandRequest, EntitlementResponse, ACCESS_TOKEN_COOKIE, COMMAND_ROUTE, ENTITLEMENT_ROUTE,
    USER_ID_COOKIE,
};
use tracing::debug;
use url::Url;

pub mod auto_reload;
pub mod dispatcher;
pub mod entitlement;
pub mod error;
pub mod forms;
pub mod page;

pub use auto_reload::AutoReloadController;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use entitlement::{EntitlementDecision, EntitlementGate};
pub use error::ConsoleError;
pub use forms::{Constraint, Document, Field, Form, FormValidationGuard, SubmitEvent};
pub use page::{HeadlessPage, Page, PageEvent};

/// The two console endpoints the controller talks to.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn fetch_entitlement(&self) -> Result<EntitlementResponse>;
    async fn submit_command(&self, request: &CommandRequest) -> Result<()>;

    /// Fetches a console page the way a browser (re)load would.
    async fn load_view(&self, path: &str) -> Result<ViewSnapshot>;
}

/// Session cookies issued by the console's login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub user_id: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.user_id.is_none()
    }

    fn cookie_header(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let pairs: Vec<String> = [
            (ACCESS_TOKEN_COOKIE, self.access_token.as_deref()),
            (USER_ID_COOKIE, self.user_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| format!("{name}={value}")))
        .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub status: u16,
    pub bytes: usize,
}

pub struct HttpConsoleApi {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl HttpConsoleApi {
    pub fn new(base_url: &str) -> std::result::Result<Self, ConsoleError> {
        Self::from_client(base_url, Client::new())
    }

    /// Uses a preconfigured client, e.g. one with proxy or TLS settings.
    pub fn from_client(base_url: &str, http: Client) -> std::result::Result<Self, ConsoleError> {
        let base_url = Url::parse(base_url).map_err(|source| ConsoleError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            base_url,
            credentials: Credentials::default(),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("cannot resolve '{path}' against {}", self.base_url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.cookie_header() {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }
}

#[async_trait]
impl ConsoleApi for HttpConsoleApi {
    async fn fetch_entitlement(&self) -> Result<EntitlementResponse> {
        let url = self.endpoint(ENTITLEMENT_ROUTE)?;
        let response = self
            .authorize(self.http.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        // 401 responses carry the same JSON shape, so the status is not checked.
        let body: EntitlementResponse = response
            .json()
            .await
            .with_context(|| format!("unreadable entitlement response from {url} ({status})"))?;
        debug!(%status, entitled = body.is_entitled(), "entitlement response");
        Ok(body)
    }

    async fn submit_command(&self, request: &CommandRequest) -> Result<()> {
        let url = self.endpoint(COMMAND_ROUTE)?;
        self.authorize(self.http.post(url.clone()))
            .json(request)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }

    async fn load_view(&self, path: &str) -> Result<ViewSnapshot> {
        let url = self.endpoint(path)?;
        let response = self
            .authorize(self.http.get(url.clone()))
            .send()
            .await
            .with_context(|| format!("failed to load {url}"))?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(ViewSnapshot {
            status,
            bytes: body.len(),
        })
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
