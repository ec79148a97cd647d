#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use jobscout_core::{FetchResult, SecurityPolicy, ValidatedTarget};
use jobscout_engine::{FetchError, Fetcher, JobPostingService, PortalSettings};

static LOGGING: Once = Once::new();

pub fn init_logging() {
    LOGGING.call_once(engine_logging::initialize_for_tests);
}

/// Serves a canned response and records every URL it was asked for.
pub struct StubFetcher {
    response: FetchResult,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            response: FetchResult {
                status,
                final_url: "https://stub.test/".to_string(),
                headers: vec![("content-type".to_string(), content_type.to_string())],
                body: body.into(),
            },
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn html(body: &str) -> Arc<Self> {
        Self::new(200, "text/html; charset=utf-8", body)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, target: &ValidatedTarget) -> Result<FetchResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(target.url().to_string());
        Ok(self.response.clone())
    }
}

pub fn service_with(fetcher: Arc<StubFetcher>) -> JobPostingService {
    JobPostingService::with_fetcher(
        Arc::new(SecurityPolicy::default()),
        fetcher,
        PortalSettings {
            api_base: "https://api.portal.test/v2/jobs".to_string(),
        },
    )
}

/// Wiremock binds to 127.0.0.1, which the default policy rightly refuses.
pub fn local_test_policy() -> SecurityPolicy {
    SecurityPolicy {
        blocked_hosts: vec!["localhost".to_string()],
        blocked_ranges: Vec::new(),
        block_loopback_literals: false,
        ..SecurityPolicy::default()
    }
}

pub fn job_page(title: &str, company: &str, description: &str) -> String {
    let json_ld = serde_json::json!({
        "@context": "https://schema.org",
        "@type": "JobPosting",
        "title": title,
        "hiringOrganization": {"@type": "Organization", "name": company},
        "description": description,
    });
    format!(
        "<html><head><script type=\"application/ld+json\">{json_ld}</script></head>\
         <body><p>Shell page</p></body></html>"
    )
}
