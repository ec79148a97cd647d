use std::fmt;

use crate::classify::Rejection;
use crate::guard::GuardRejection;
use crate::source::JobSource;

const PASTE_HINT: &str = "Copy the job description from the page and paste it in manually.";
const SITE_HINT: &str = "Check that the link opens a public job posting in a private browser window.";

/// Every way an extraction request can end without content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Guard(GuardRejection),
    Timeout,
    ResponseTooLarge { max_bytes: u64, actual: Option<u64> },
    RedirectBlocked,
    ResolvedToBlockedAddress,
    Network,
    Upstream(Rejection),
    InsufficientContent { length: usize, min: usize },
    Internal,
}

impl FailureKind {
    /// HTTP status reported to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            FailureKind::Guard(_) => 400,
            FailureKind::RedirectBlocked | FailureKind::ResolvedToBlockedAddress => 400,
            FailureKind::Timeout => 408,
            FailureKind::ResponseTooLarge { .. } => 413,
            FailureKind::Network => 502,
            FailureKind::Upstream(rejection) => match rejection {
                Rejection::AuthWallOrForbidden(_) | Rejection::AuthWall => 403,
                Rejection::NotFound => 404,
                Rejection::UnsupportedContentType(_) => 400,
                Rejection::UpstreamError(status) if (400..=599).contains(status) => *status,
                Rejection::UpstreamError(_) => 502,
            },
            FailureKind::InsufficientContent { .. } => 422,
            FailureKind::Internal => 500,
        }
    }

    /// Human-facing description; never a raw transport error.
    pub fn user_message(&self) -> String {
        match self {
            FailureKind::Guard(GuardRejection::MissingUrl) => "A URL is required".to_string(),
            FailureKind::Guard(GuardRejection::InputTooLarge { max, .. }) => {
                format!("URL is too long (limit is {max} characters)")
            }
            FailureKind::Guard(GuardRejection::MalformedUrl(_)) => "Invalid URL format".to_string(),
            FailureKind::Guard(GuardRejection::ProtocolNotAllowed(_)) => {
                "Only HTTP and HTTPS URLs are supported".to_string()
            }
            FailureKind::Guard(_) | FailureKind::ResolvedToBlockedAddress => {
                "Access to internal or private network addresses is not allowed".to_string()
            }
            FailureKind::RedirectBlocked => {
                "The page redirected to an address that is not allowed".to_string()
            }
            FailureKind::Timeout => "Request timeout: the page took too long to load".to_string(),
            FailureKind::ResponseTooLarge { max_bytes, .. } => {
                format!("Page is too large (limit is {} MB)", max_bytes / (1024 * 1024))
            }
            FailureKind::Network => "Could not connect to the site".to_string(),
            FailureKind::Upstream(Rejection::AuthWallOrForbidden(_)) | FailureKind::Upstream(Rejection::AuthWall) => {
                "This page requires login or blocks automated access".to_string()
            }
            FailureKind::Upstream(Rejection::NotFound) => {
                "Job posting not found. It may have expired or been removed".to_string()
            }
            FailureKind::Upstream(Rejection::UnsupportedContentType(content_type)) => {
                format!("URL does not point to a web page (content type {content_type})")
            }
            FailureKind::Upstream(Rejection::UpstreamError(status)) => {
                format!("The site responded with HTTP {status}")
            }
            FailureKind::InsufficientContent { .. } => {
                "Could not extract enough job content from this page".to_string()
            }
            FailureKind::Internal => "Failed to fetch the job posting".to_string(),
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FailureKind::Upstream(Rejection::AuthWallOrForbidden(_))
            | FailureKind::Upstream(Rejection::AuthWall)
            | FailureKind::Upstream(Rejection::UnsupportedContentType(_))
            | FailureKind::InsufficientContent { .. }
            | FailureKind::Timeout
            | FailureKind::ResponseTooLarge { .. } => Some(PASTE_HINT),
            FailureKind::Upstream(Rejection::NotFound) => Some(SITE_HINT),
            _ => None,
        }
    }

    pub fn is_security_rejection(&self) -> bool {
        match self {
            FailureKind::Guard(rejection) => !matches!(
                rejection,
                GuardRejection::MissingUrl
                    | GuardRejection::InputTooLarge { .. }
                    | GuardRejection::MalformedUrl(_)
            ),
            FailureKind::RedirectBlocked | FailureKind::ResolvedToBlockedAddress => true,
            _ => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Guard(rejection) => write!(f, "guard rejected url: {rejection}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ResponseTooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::RedirectBlocked => write!(f, "redirect target blocked"),
            FailureKind::ResolvedToBlockedAddress => write!(f, "host resolved to blocked address"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Upstream(rejection) => write!(f, "{rejection}"),
            FailureKind::InsufficientContent { length, min } => {
                write!(f, "insufficient content ({length} < {min} chars)")
            }
            FailureKind::Internal => write!(f, "internal error"),
        }
    }
}

impl From<GuardRejection> for FailureKind {
    fn from(rejection: GuardRejection) -> Self {
        FailureKind::Guard(rejection)
    }
}

impl From<Rejection> for FailureKind {
    fn from(rejection: Rejection) -> Self {
        FailureKind::Upstream(rejection)
    }
}

/// A classified failure plus diagnostic detail for the logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExtractFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Known once the guard has accepted the URL.
    pub board: Option<JobSource>,
}

impl ExtractFailure {
    pub fn new(kind: impl Into<FailureKind>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            board: None,
        }
    }

    pub fn with_board(mut self, board: JobSource) -> Self {
        self.board = Some(board);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}
