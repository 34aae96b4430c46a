use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("entitlement check failed: {source}")]
    EntitlementCheck { source: anyhow::Error },
    #[error("invalid console url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("no form with id '{0}' on this page")]
    UnknownForm(String),
}
