use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// A CIDR block the guard refuses to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    network: IpAddr,
    prefix_len: u8,
}

impl AddressRange {
    pub const fn v4(a: u8, b: u8, c: u8, d: u8, prefix_len: u8) -> Self {
        Self {
            network: IpAddr::V4(Ipv4Addr::new(a, b, c, d)),
            prefix_len,
        }
    }

    pub const fn v6(segments: [u16; 8], prefix_len: u8) -> Self {
        let [a, b, c, d, e, f, g, h] = segments;
        Self {
            network: IpAddr::V6(Ipv6Addr::new(a, b, c, d, e, f, g, h)),
            prefix_len,
        }
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        // IPv4-mapped IPv6 addresses are judged by their IPv4 form.
        match (self.network, addr.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let prefix = u32::from(self.prefix_len.min(32));
                let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let prefix = u32::from(self.prefix_len.min(128));
                let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// RFC1918, RFC6598, link-local, benchmark, unique-local and IPv6 link-local.
pub const DEFAULT_BLOCKED_RANGES: [AddressRange; 8] = [
    AddressRange::v4(10, 0, 0, 0, 8),
    AddressRange::v4(172, 16, 0, 0, 12),
    AddressRange::v4(192, 168, 0, 0, 16),
    AddressRange::v4(100, 64, 0, 0, 10),
    AddressRange::v4(169, 254, 0, 0, 16),
    AddressRange::v4(198, 18, 0, 0, 15),
    AddressRange::v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7),
    AddressRange::v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10),
];

pub const DEFAULT_BLOCKED_HOSTS: [&str; 9] = [
    "localhost",
    "127.0.0.1",
    "0.0.0.0",
    "::1",
    "::",
    "169.254.169.254",
    "metadata",
    "metadata.google.internal",
    "instance-data",
];

/// Process-wide, read-only limits applied to every extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub max_response_bytes: u64,
    pub fetch_timeout: Duration,
    pub allowed_protocols: Vec<String>,
    pub blocked_hosts: Vec<String>,
    pub blocked_ranges: Vec<AddressRange>,
    /// Reject dotted-quad literals whose first octet is 0 or 127.
    pub block_loopback_literals: bool,
    pub min_content_chars: usize,
    pub max_content_chars: usize,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            max_response_bytes: 5 * 1024 * 1024,
            fetch_timeout: Duration::from_secs(8),
            allowed_protocols: vec!["http".to_string(), "https".to_string()],
            blocked_hosts: DEFAULT_BLOCKED_HOSTS
                .iter()
                .map(|host| host.to_string())
                .collect(),
            blocked_ranges: DEFAULT_BLOCKED_RANGES.to_vec(),
            block_loopback_literals: true,
            min_content_chars: 100,
            max_content_chars: 15_000,
        }
    }
}

impl SecurityPolicy {
    pub fn is_protocol_allowed(&self, scheme: &str) -> bool {
        self.allowed_protocols
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
    }

    pub fn is_blocked_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        self.blocked_hosts
            .iter()
            .any(|blocked| normalize_host(blocked) == host)
    }

    pub fn blocked_range_for(&self, addr: IpAddr) -> Option<AddressRange> {
        self.blocked_ranges
            .iter()
            .copied()
            .find(|range| range.contains(addr))
    }

    /// `0.x`/`127.x`, `::1` and `::`, including their IPv4-mapped IPv6 forms.
    pub fn is_loopback_literal(&self, addr: IpAddr) -> bool {
        if !self.block_loopback_literals {
            return false;
        }
        match addr.to_canonical() {
            IpAddr::V4(v4) => matches!(v4.octets()[0], 0 | 127),
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
        }
    }

    /// Full check for an address obtained from DNS rather than typed by the caller.
    pub fn is_blocked_address(&self, addr: IpAddr) -> bool {
        let addr = addr.to_canonical();
        self.is_blocked_host(&addr.to_string())
            || self.blocked_range_for(addr).is_some()
            || self.is_loopback_literal(addr)
    }
}

fn normalize_host(host: &str) -> String {
    host.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}
