use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;
use url::{Host, Url};

use crate::policy::SecurityPolicy;

pub const MAX_URL_LENGTH: usize = 2048;

/// A URL that passed every guard check. Only [`Guard::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    url: Url,
    hostname: String,
    protocol: String,
}

impl ValidatedTarget {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    pub fn is_ip_literal(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("url is empty")]
    MissingUrl,
    #[error("url is {length} characters, limit is {max}")]
    InputTooLarge { length: usize, max: usize },
    #[error("malformed url: {0}")]
    MalformedUrl(String),
    #[error("protocol {0:?} is not allowed")]
    ProtocolNotAllowed(String),
    #[error("host {0} is blocked")]
    BlockedHost(String),
    #[error("host {host} is inside blocked range {range}")]
    BlockedAddressRange { host: String, range: String },
    #[error("host {0} is a loopback or unspecified address")]
    LoopbackAddress(String),
}

/// Lexical, pre-resolution URL policy. Never performs I/O.
#[derive(Debug, Clone)]
pub struct Guard {
    policy: Arc<SecurityPolicy>,
}

impl Guard {
    pub fn new(policy: Arc<SecurityPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Runs the checks in order; the first failing check wins.
    pub fn validate(&self, raw_url: &str) -> Result<ValidatedTarget, GuardRejection> {
        let raw_url = raw_url.trim();
        if raw_url.is_empty() {
            return Err(GuardRejection::MissingUrl);
        }
        let length = raw_url.chars().count();
        if length > MAX_URL_LENGTH {
            return Err(GuardRejection::InputTooLarge {
                length,
                max: MAX_URL_LENGTH,
            });
        }

        let url =
            Url::parse(raw_url).map_err(|err| GuardRejection::MalformedUrl(err.to_string()))?;
        self.validate_parsed(url)
    }

    /// Same checks as [`Guard::validate`] for an already parsed URL, e.g. a redirect hop.
    pub fn validate_parsed(&self, url: Url) -> Result<ValidatedTarget, GuardRejection> {
        let protocol = url.scheme().to_ascii_lowercase();
        if !self.policy.is_protocol_allowed(&protocol) {
            return Err(GuardRejection::ProtocolNotAllowed(protocol));
        }

        let hostname = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(GuardRejection::MalformedUrl("url has no host".to_string())),
        };

        if self.policy.is_blocked_host(&hostname) {
            return Err(GuardRejection::BlockedHost(hostname));
        }

        let literal = match url.host() {
            Some(Host::Ipv4(addr)) => Some(IpAddr::V4(addr)),
            Some(Host::Ipv6(addr)) => Some(IpAddr::V6(addr)),
            _ => None,
        };
        // IPv4-mapped IPv6 literals are judged as the IPv4 address they carry.
        let Some(literal) = literal.map(|addr| addr.to_canonical()) else {
            return Ok(ValidatedTarget {
                url,
                hostname,
                protocol,
            });
        };

        if let Some(range) = self.policy.blocked_range_for(literal) {
            return Err(GuardRejection::BlockedAddressRange {
                host: hostname,
                range: range.to_string(),
            });
        }

        if self.policy.is_loopback_literal(literal) {
            return Err(GuardRejection::LoopbackAddress(hostname));
        }

        Ok(ValidatedTarget {
            url,
            hostname,
            protocol,
        })
    }
}
