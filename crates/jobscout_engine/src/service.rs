use std::sync::Arc;

use engine_logging::{engine_audit, engine_debug, engine_info, engine_warn};
use jobscout_core::{
    assemble, classify, extract_posting, ExtractFailure, ExtractedPosting, ExtractionOutcome,
    FailureKind, Guard, JobPostingResponse, JobSource, ParseMethod, SecurityPolicy, ValidatedTarget,
};
use serde::Deserialize;

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::portal::{PortalClient, PortalSettings};

/// Inbound request: a single untrusted URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    #[serde(alias = "url", default)]
    pub raw_url: String,
}

impl FetchRequest {
    pub fn new(raw_url: impl Into<String>) -> Self {
        Self {
            raw_url: raw_url.into(),
        }
    }
}

/// Guard, fetch, classify, extract, assemble. One instance serves any
/// number of concurrent requests; the policy is never mutated.
pub struct JobPostingService {
    policy: Arc<SecurityPolicy>,
    guard: Guard,
    fetcher: Arc<dyn Fetcher>,
    portal: PortalClient,
}

impl JobPostingService {
    pub fn new(policy: SecurityPolicy) -> Self {
        let policy = Arc::new(policy);
        let fetcher = Arc::new(ReqwestFetcher::new(policy.clone(), FetchSettings::default()));
        Self::with_fetcher(policy, fetcher, PortalSettings::default())
    }

    pub fn with_fetcher(
        policy: Arc<SecurityPolicy>,
        fetcher: Arc<dyn Fetcher>,
        portal_settings: PortalSettings,
    ) -> Self {
        let guard = Guard::new(policy.clone());
        let portal = PortalClient::new(guard.clone(), fetcher.clone(), portal_settings);
        Self {
            policy,
            guard,
            fetcher,
            portal,
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// `ExtractJobPosting`: always yields a status and a body, never an error.
    pub async fn extract_job_posting(&self, request: FetchRequest) -> JobPostingResponse {
        JobPostingResponse::from_result(self.extract(&request.raw_url).await)
    }

    pub async fn extract(&self, raw_url: &str) -> Result<ExtractedPosting, ExtractFailure> {
        let target = self.guard.validate(raw_url).map_err(|rejection| {
            let failure = ExtractFailure::new(rejection.clone(), "url rejected before fetch");
            if failure.kind.is_security_rejection() {
                engine_audit!("blocked request: {rejection}");
            } else {
                engine_debug!("invalid request url: {rejection}");
            }
            failure
        })?;

        let source = JobSource::from_host(target.hostname());
        let url = target.url().to_string();
        let result = match PortalClient::job_id_for(&target) {
            Some(job_id) => self.extract_from_portal(&job_id, source).await,
            None => self.extract_from_page(&target).await,
        };

        match result {
            Ok(outcome) => {
                let posting = assemble(outcome, &url, &self.policy);
                engine_info!(
                    "extracted {} chars from {} via {}{}",
                    posting.content_length,
                    posting.source,
                    posting.method,
                    if posting.truncated { " (truncated)" } else { "" }
                );
                Ok(posting)
            }
            Err(failure) => {
                if failure.kind.is_security_rejection() {
                    engine_audit!("blocked during fetch of {}: {}", target.hostname(), failure);
                } else {
                    engine_warn!("extraction from {} failed: {}", target.hostname(), failure);
                }
                Err(failure.with_board(source))
            }
        }
    }

    async fn extract_from_page(
        &self,
        target: &ValidatedTarget,
    ) -> Result<ExtractionOutcome, ExtractFailure> {
        let source = JobSource::from_host(target.hostname());
        let response = self.fetcher.fetch(target).await?;
        engine_debug!(
            "fetched {} bytes from {} (status {})",
            response.body.len(),
            response.final_url,
            response.status
        );

        let decoded = classify(&response).map_err(|rejection| {
            ExtractFailure::new(rejection, format!("classified {}", response.final_url))
        })?;
        if decoded.had_replacements {
            engine_debug!(
                "body of {} decoded as {} with replacements",
                response.final_url,
                decoded.encoding_label
            );
        }

        extract_posting(&decoded.text, source, &self.policy)
            .map_err(|kind| ExtractFailure::new(kind, "extraction cascade"))
    }

    async fn extract_from_portal(
        &self,
        job_id: &str,
        source: JobSource,
    ) -> Result<ExtractionOutcome, ExtractFailure> {
        let posting = self.portal.fetch_posting(job_id).await?;
        let content = posting.to_content();
        let length = content.chars().count();
        let min = self.policy.min_content_chars;
        if length < min {
            return Err(ExtractFailure::new(
                FailureKind::InsufficientContent { length, min },
                format!("portal job {job_id}"),
            ));
        }
        Ok(ExtractionOutcome {
            content,
            source,
            method: ParseMethod::PortalApi,
        })
    }
}
