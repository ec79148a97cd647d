use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use futures_util::{Stream, StreamExt};
use jobscout_core::{FetchResult, Guard, SecurityPolicy, ValidatedTarget};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;

use crate::{FetchError, FetchFailure};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Transport knobs that sit next to the [`SecurityPolicy`] limits.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            redirect_limit: 5,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.8,*/*;q=0.7"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs exactly one outbound request. Never retries.
    async fn fetch(&self, target: &ValidatedTarget) -> Result<FetchResult, FetchError>;
}

/// What happened to one request while reqwest followed it. Shared between
/// the redirect policy, the resolver and the error mapping.
#[derive(Debug, Default)]
struct RequestTrace {
    redirected: AtomicBool,
    redirect_blocked: AtomicBool,
    resolved_blocked: AtomicBool,
}

#[derive(Debug, Error)]
#[error("{host} resolved to blocked address {addr}")]
struct BlockedResolution {
    host: String,
    addr: IpAddr,
}

/// DNS for every connection the client opens, the initial host and each
/// redirect hop alike. Any answer inside the policy's blocked space fails
/// the whole lookup. IP literals never reach a resolver; the guard has
/// already judged them.
struct PolicyResolver {
    policy: Arc<SecurityPolicy>,
    trace: Arc<RequestTrace>,
}

impl Resolve for PolicyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_checked(
            self.policy.clone(),
            self.trace.clone(),
            name.as_str().to_string(),
        ))
    }
}

async fn resolve_checked(
    policy: Arc<SecurityPolicy>,
    trace: Arc<RequestTrace>,
    host: String,
) -> Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await?
        .collect();
    if let Some(blocked) = addrs.iter().find(|addr| policy.is_blocked_address(addr.ip())) {
        trace.resolved_blocked.store(true, Ordering::Relaxed);
        return Err(Box::new(BlockedResolution {
            host,
            addr: blocked.ip(),
        }));
    }
    engine_debug!("resolved {host} to {addrs:?}");
    Ok(Box::new(addrs.into_iter()))
}

/// Bounded fetcher: one wall-clock timeout, one byte ceiling, and every
/// resolved address checked against the policy before connecting.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    policy: Arc<SecurityPolicy>,
    guard: Guard,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(policy: Arc<SecurityPolicy>, settings: FetchSettings) -> Self {
        Self {
            guard: Guard::new(policy.clone()),
            policy,
            settings,
        }
    }

    fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    fn build_client(&self, trace: Arc<RequestTrace>) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let guard = self.guard.clone();
        let hops = trace.clone();
        let redirect = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= redirect_limit {
                return attempt.error("redirect limit exceeded");
            }
            match guard.validate_parsed(attempt.url().clone()) {
                Ok(_) => {
                    hops.redirected.store(true, Ordering::Relaxed);
                    attempt.follow()
                }
                Err(rejection) => {
                    hops.redirect_blocked.store(true, Ordering::Relaxed);
                    attempt.error(rejection.to_string())
                }
            }
        });
        let resolver = PolicyResolver {
            policy: self.policy.clone(),
            trace,
        };

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.policy().fetch_timeout)
            .default_headers(self.default_headers())
            .redirect(redirect)
            .dns_resolver(Arc::new(resolver))
            .build()
            .map_err(|err| FetchError::new(FetchFailure::Network, err.to_string()))
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (USER_AGENT, &self.settings.user_agent),
            (ACCEPT, &self.settings.accept),
            (ACCEPT_LANGUAGE, &self.settings.accept_language),
        ] {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        }
        headers
    }

    async fn fetch_bounded(&self, target: &ValidatedTarget) -> Result<FetchResult, FetchError> {
        let trace = Arc::new(RequestTrace::default());
        let client = self.build_client(trace.clone())?;

        let response = client
            .get(target.url().clone())
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, &trace))?;

        let max_bytes = self.policy().max_response_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FetchFailure::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "declared content length over limit",
                ));
            }
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        let body = read_bounded(response.bytes_stream(), max_bytes)
            .await
            .map_err(|err| match err {
                BoundedReadError::TooLarge(actual) => FetchError::new(
                    FetchFailure::TooLarge {
                        max_bytes,
                        actual: Some(actual),
                    },
                    "response body over limit",
                ),
                BoundedReadError::Transport(err) => map_reqwest_error(err, &trace),
            })?;

        Ok(FetchResult {
            status,
            final_url,
            headers,
            body,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, target: &ValidatedTarget) -> Result<FetchResult, FetchError> {
        let timeout = self.policy().fetch_timeout;
        match tokio::time::timeout(timeout, self.fetch_bounded(target)).await {
            Ok(result) => result,
            Err(_) => {
                engine_warn!("fetch of {} exceeded {:?}", target.hostname(), timeout);
                Err(FetchError::new(
                    FetchFailure::Timeout,
                    format!("no complete response within {timeout:?}"),
                ))
            }
        }
    }
}

pub(crate) enum BoundedReadError<E> {
    /// Bytes read so far including the chunk that crossed the limit.
    TooLarge(u64),
    Transport(E),
}

/// Collects a body stream, aborting as soon as the running total passes
/// `max_bytes`. The `Content-Length` header is not trusted here.
pub(crate) async fn read_bounded<S, B, E>(
    stream: S,
    max_bytes: u64,
) -> Result<Vec<u8>, BoundedReadError<E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BoundedReadError::Transport)?;
        let chunk = chunk.as_ref();
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(BoundedReadError::TooLarge(next_len));
        }
        bytes.extend_from_slice(chunk);
    }
    Ok(bytes)
}

fn map_reqwest_error(err: reqwest::Error, trace: &RequestTrace) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FetchFailure::Timeout, err.to_string());
    }
    if trace.resolved_blocked.load(Ordering::Relaxed) {
        let kind = if trace.redirected.load(Ordering::Relaxed) {
            FetchFailure::RedirectBlocked
        } else {
            FetchFailure::ResolvedToBlockedAddress
        };
        return FetchError::new(kind, error_chain(&err));
    }
    if err.is_redirect() {
        let kind = if trace.redirect_blocked.load(Ordering::Relaxed) {
            FetchFailure::RedirectBlocked
        } else {
            FetchFailure::RedirectLimitExceeded
        };
        return FetchError::new(kind, err.to_string());
    }
    FetchError::new(FetchFailure::Network, error_chain(&err))
}

/// reqwest keeps the interesting part (resolver or socket error) in the source chain.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::convert::Infallible;

    fn chunks(sizes: &[usize]) -> impl Stream<Item = Result<Vec<u8>, Infallible>> {
        stream::iter(
            sizes
                .iter()
                .map(|size| Ok(vec![b'x'; *size]))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn body_exactly_at_limit_is_kept() {
        let body = read_bounded(chunks(&[4, 4, 2]), 10).await.ok().unwrap();
        assert_eq!(body.len(), 10);
    }

    #[tokio::test]
    async fn one_byte_over_limit_aborts() {
        match read_bounded(chunks(&[4, 4, 3]), 10).await {
            Err(BoundedReadError::TooLarge(actual)) => assert_eq!(actual, 11),
            _ => panic!("expected TooLarge"),
        }
    }

    #[tokio::test]
    async fn abort_happens_before_later_chunks_are_read() {
        let source = stream::iter(vec![
            Ok(vec![0u8; 8]),
            Ok(vec![0u8; 8]),
            Err("stream should have been dropped before this chunk"),
        ]);
        assert!(matches!(
            read_bounded(source, 10).await,
            Err(BoundedReadError::TooLarge(16))
        ));
    }

    #[test]
    fn default_headers_mimic_a_browser() {
        let fetcher = ReqwestFetcher::new(
            Arc::new(SecurityPolicy::default()),
            FetchSettings::default(),
        );
        let headers = fetcher.default_headers();
        assert!(headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ua| ua.starts_with("Mozilla/5.0")));
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
    }
}
