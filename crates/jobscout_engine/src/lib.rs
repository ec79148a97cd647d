//! Jobscout engine: outbound fetching and the end-to-end extraction service.
mod fetch;
mod portal;
mod service;
mod types;

pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use portal::{PortalClient, PortalSettings, DEFAULT_PORTAL_API};
pub use service::{FetchRequest, JobPostingService};
pub use types::{FetchError, FetchFailure};
