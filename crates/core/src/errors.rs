use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

/// Failures the message handler contains per event. Parsing never fails:
/// unrecognized text is simply no intent.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("score store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("reply delivery failed: {0}")]
    SendFailure(String),
}

impl ApplicationError {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::SendFailure(_) => "send_failure",
        }
    }
}
