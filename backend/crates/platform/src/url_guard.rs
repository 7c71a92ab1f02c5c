//! URL Safety Guard
//!
//! Pure, deterministic SSRF pre-flight classification. No name resolution
//! happens here; callers that connect must re-check the resolved addresses
//! with [`is_blocked_ip`].
//!
//! Checks run in this order and stop at the first failure:
//! 1. parse
//! 2. scheme allow-list ([`SchemePolicy`])
//! 3. non-empty host
//! 4. `localhost` / `*.localhost`
//! 5. literal IP against [`BLOCKED_V4`] / [`BLOCKED_V6`]
//! 6. `*.local` for host names
//! 7. embedded `file://`, `ftp://`, `gopher://` markers anywhere in the URL

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{Ipv4Net, Ipv6Net};
use thiserror::Error;
use url::{Host, Url};

/// Blocked IPv4 ranges
pub const BLOCKED_V4: [Ipv4Net; 6] = [
    Ipv4Net::new_assert(Ipv4Addr::new(0, 0, 0, 0), 8),
    Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8),
    Ipv4Net::new_assert(Ipv4Addr::new(127, 0, 0, 0), 8),
    Ipv4Net::new_assert(Ipv4Addr::new(169, 254, 0, 0), 16),
    Ipv4Net::new_assert(Ipv4Addr::new(172, 16, 0, 0), 12),
    Ipv4Net::new_assert(Ipv4Addr::new(192, 168, 0, 0), 16),
];

/// Blocked IPv6 ranges
pub const BLOCKED_V6: [Ipv6Net; 4] = [
    Ipv6Net::new_assert(Ipv6Addr::UNSPECIFIED, 128),
    Ipv6Net::new_assert(Ipv6Addr::LOCALHOST, 128),
    Ipv6Net::new_assert(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
    Ipv6Net::new_assert(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
];

const DISALLOWED_HOSTS: &[&str] = &["localhost"];
const LOCALHOST_SUFFIX: &str = ".localhost";
const LOCAL_DOMAIN_SUFFIX: &str = ".local";
const SUSPICIOUS_MARKERS: &[&str] = &["file://", "ftp://", "gopher://"];

/// Which schemes a caller accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemePolicy {
    /// Outbound integration calls
    HttpOrHttps,
    /// Links stored on user content
    HttpsOnly,
}

impl SchemePolicy {
    fn allows(&self, scheme: &str) -> bool {
        match self {
            SchemePolicy::HttpOrHttps => matches!(scheme, "http" | "https"),
            SchemePolicy::HttpsOnly => scheme == "https",
        }
    }
}

/// Why a URL was classified unsafe
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsafeUrl {
    #[error("URL could not be parsed")]
    Unparsable,

    #[error("URL scheme '{0}' is not allowed")]
    DisallowedScheme(String),

    #[error("URL has no host")]
    EmptyHost,

    #[error("Host '{0}' is not allowed")]
    DisallowedHost(String),

    #[error("Address {0} is in a blocked network range")]
    BlockedAddress(IpAddr),

    #[error("Local domain '{0}' is not allowed")]
    LocalDomain(String),

    #[error("URL contains disallowed scheme marker '{0}'")]
    SuspiciousScheme(&'static str),
}

impl UnsafeUrl {
    /// Stable machine readable reason
    pub const fn reason(&self) -> &'static str {
        match self {
            UnsafeUrl::Unparsable => "unparsable",
            UnsafeUrl::DisallowedScheme(_) => "disallowed_scheme",
            UnsafeUrl::EmptyHost => "empty_host",
            UnsafeUrl::DisallowedHost(_) => "disallowed_host",
            UnsafeUrl::BlockedAddress(_) => "blocked_address",
            UnsafeUrl::LocalDomain(_) => "local_domain",
            UnsafeUrl::SuspiciousScheme(_) => "suspicious_scheme",
        }
    }
}

/// Classify `raw`, returning the parsed URL when it is safe
///
/// ## Examples
/// ```rust
/// use platform::url_guard::{SchemePolicy, classify};
///
/// assert!(classify("https://api.example.com/x", SchemePolicy::HttpsOnly).is_ok());
/// assert!(classify("http://example.com", SchemePolicy::HttpsOnly).is_err());
/// assert!(classify("https://127.0.0.1/x", SchemePolicy::HttpOrHttps).is_err());
/// ```
pub fn classify(raw: &str, policy: SchemePolicy) -> Result<Url, UnsafeUrl> {
    let url = Url::parse(raw.trim()).map_err(|_| UnsafeUrl::Unparsable)?;
    check_url(&url, policy)?;

    let lowered = raw.to_ascii_lowercase();
    if let Some(marker) = SUSPICIOUS_MARKERS.iter().find(|m| lowered.contains(*m)) {
        return Err(UnsafeUrl::SuspiciousScheme(*marker));
    }

    Ok(url)
}

/// Convenience boolean form of [`classify`]
pub fn is_safe(raw: &str, policy: SchemePolicy) -> bool {
    classify(raw, policy).is_ok()
}

/// Checks 2-6 on an already parsed URL
pub fn check_url(url: &Url, policy: SchemePolicy) -> Result<(), UnsafeUrl> {
    if !policy.allows(url.scheme()) {
        return Err(UnsafeUrl::DisallowedScheme(url.scheme().to_string()));
    }

    match url.host() {
        None => Err(UnsafeUrl::EmptyHost),
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => check_domain(domain),
    }
}

fn check_domain(domain: &str) -> Result<(), UnsafeUrl> {
    let host = domain.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return Err(UnsafeUrl::EmptyHost);
    }

    if DISALLOWED_HOSTS.contains(&host.as_str()) || host.ends_with(LOCALHOST_SUFFIX) {
        return Err(UnsafeUrl::DisallowedHost(host));
    }

    // Some parsers leave bracketless or odd literals as domains
    if let Ok(ip) = host.parse::<IpAddr>() {
        return check_ip(ip);
    }

    if host.ends_with(LOCAL_DOMAIN_SUFFIX) {
        return Err(UnsafeUrl::LocalDomain(host));
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), UnsafeUrl> {
    if is_blocked_ip(ip) {
        Err(UnsafeUrl::BlockedAddress(ip))
    } else {
        Ok(())
    }
}

/// Whether `ip` falls in a blocked range
///
/// IPv4-mapped IPv6 addresses are judged by their IPv4 value.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => BLOCKED_V4.iter().any(|net| net.contains(&v4)),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_blocked_ip(IpAddr::V4(v4)),
            None => BLOCKED_V6.iter().any(|net| net.contains(&v6)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(raw: &str, policy: SchemePolicy) -> &'static str {
        classify(raw, policy).unwrap_err().reason()
    }

    #[test]
    fn test_safe_urls() {
        assert!(is_safe("https://api.example.com/x", SchemePolicy::HttpsOnly));
        assert!(is_safe("http://example.com/path?q=1", SchemePolicy::HttpOrHttps));
        assert!(is_safe("https://8.8.8.8/", SchemePolicy::HttpOrHttps));
        assert!(is_safe("https://[2606:4700::1111]/", SchemePolicy::HttpOrHttps));
    }

    #[test]
    fn test_scheme_policy() {
        assert_eq!(reason("http://example.com", SchemePolicy::HttpsOnly), "disallowed_scheme");
        assert_eq!(reason("file:///etc/passwd", SchemePolicy::HttpOrHttps), "disallowed_scheme");
        assert_eq!(reason("ftp://example.com/", SchemePolicy::HttpOrHttps), "disallowed_scheme");
        assert_eq!(reason("javascript:alert(1)", SchemePolicy::HttpOrHttps), "disallowed_scheme");
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(reason("not a url", SchemePolicy::HttpOrHttps), "unparsable");
        assert_eq!(reason("", SchemePolicy::HttpOrHttps), "unparsable");
        assert_eq!(reason("https://", SchemePolicy::HttpOrHttps), "unparsable");
    }

    #[test]
    fn test_localhost_names() {
        for raw in [
            "https://localhost/x",
            "https://LOCALHOST/x",
            "https://localhost./x",
            "https://app.localhost/x",
        ] {
            assert_eq!(reason(raw, SchemePolicy::HttpsOnly), "disallowed_host", "{raw}");
        }
    }

    #[test]
    fn test_blocked_ipv4_literals() {
        for raw in [
            "https://127.0.0.1/x",
            "https://127.1/x",
            "https://2130706433/x",
            "https://0.0.0.0/",
            "https://10.1.2.3/",
            "https://169.254.169.254/latest/meta-data",
            "https://172.16.0.1/",
            "https://172.31.255.255/",
            "https://192.168.1.1/",
        ] {
            assert_eq!(reason(raw, SchemePolicy::HttpOrHttps), "blocked_address", "{raw}");
        }
        assert!(is_safe("https://172.32.0.1/", SchemePolicy::HttpOrHttps));
    }

    #[test]
    fn test_blocked_ipv6_literals() {
        for raw in [
            "https://[::1]/",
            "https://[::]/",
            "https://[fd00::1]/",
            "https://[fe80::1]/",
            "https://[::ffff:127.0.0.1]/",
            "https://[::ffff:10.0.0.1]/",
        ] {
            assert_eq!(reason(raw, SchemePolicy::HttpOrHttps), "blocked_address", "{raw}");
        }
    }

    #[test]
    fn test_local_domain() {
        assert_eq!(reason("https://anything.local/x", SchemePolicy::HttpsOnly), "local_domain");
        assert_eq!(reason("https://printer.local./x", SchemePolicy::HttpsOnly), "local_domain");
        assert!(is_safe("https://local.example.com/", SchemePolicy::HttpsOnly));
    }

    #[test]
    fn test_suspicious_markers() {
        assert_eq!(
            reason("https://example.com/?next=file:///etc/passwd", SchemePolicy::HttpOrHttps),
            "suspicious_scheme"
        );
        assert_eq!(
            reason("https://example.com/GOPHER://x", SchemePolicy::HttpOrHttps),
            "suspicious_scheme"
        );
    }

    #[test]
    fn test_is_blocked_ip() {
        assert!(is_blocked_ip("10.0.0.1".parse().unwrap()));
        assert!(is_blocked_ip("::ffff:192.168.0.1".parse().unwrap()));
        assert!(!is_blocked_ip("93.184.216.34".parse().unwrap()));
        assert!(!is_blocked_ip("2001:db8::1".parse().unwrap()));
    }
}
