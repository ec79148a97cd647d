use std::fmt;

use jobscout_core::{ExtractFailure, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchFailure,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FetchFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    RedirectBlocked,
    RedirectLimitExceeded,
    ResolvedToBlockedAddress,
    Network,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "timeout"),
            FetchFailure::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FetchFailure::RedirectBlocked => write!(f, "redirect target blocked"),
            FetchFailure::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FetchFailure::ResolvedToBlockedAddress => write!(f, "resolved to blocked address"),
            FetchFailure::Network => write!(f, "network error"),
        }
    }
}

impl From<FetchFailure> for FailureKind {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Timeout => FailureKind::Timeout,
            FetchFailure::TooLarge { max_bytes, actual } => {
                FailureKind::ResponseTooLarge { max_bytes, actual }
            }
            FetchFailure::RedirectBlocked => FailureKind::RedirectBlocked,
            FetchFailure::ResolvedToBlockedAddress => FailureKind::ResolvedToBlockedAddress,
            FetchFailure::RedirectLimitExceeded | FetchFailure::Network => FailureKind::Network,
        }
    }
}

impl From<FetchError> for ExtractFailure {
    fn from(err: FetchError) -> Self {
        ExtractFailure::new(err.kind, err.message)
    }
}
