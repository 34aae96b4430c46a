use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ClusterName;

pub const ENTITLEMENT_ROUTE: &str = "/api/v1/isEntitled";
pub const COMMAND_ROUTE: &str = "/";
pub const HOME_PATH: &str = "/";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Fragment (without `#`) that keeps auto-reload on across reloads.
pub const AUTORELOAD_FRAGMENT: &str = "autoreload";

pub const NEEDS_VALIDATION_CLASS: &str = "needs-validation";
pub const WAS_VALIDATED_CLASS: &str = "was-validated";

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const USER_ID_COOKIE: &str = "user_id";

pub const AUTORELOAD_INTERVAL: Duration = Duration::from_millis(30_000);
pub const POST_DISPATCH_REDIRECT_DELAY: Duration = Duration::from_millis(1_000);

pub const AKS_START: &str = "aks-start";
pub const AKS_STOP: &str = "aks-stop";

/// Body of `POST /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    #[serde(rename = "cluster")]
    pub target: ClusterName,
    pub command: String,
}

impl CommandRequest {
    pub fn new(target: impl Into<ClusterName>, command: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            command: command.into(),
        }
    }
}

/// Body of `GET /api/v1/isEntitled`.
///
/// The server sends this shape on every status code, including 401, so
/// `is_entitled` is optional and kept as raw JSON: only the string `"true"`
/// grants access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitlementResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_entitled: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntitlementResponse {
    pub fn entitled() -> Self {
        Self {
            is_entitled: Some(serde_json::Value::String("true".into())),
            error: None,
        }
    }

    pub fn not_entitled() -> Self {
        Self {
            is_entitled: Some(serde_json::Value::String("false".into())),
            error: None,
        }
    }

    pub fn is_entitled(&self) -> bool {
        matches!(&self.is_entitled, Some(serde_json::Value::String(flag)) if flag == "true")
    }
}
