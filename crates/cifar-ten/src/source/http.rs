// crates/cifar-ten/src/source/http.rs
// ============================================================================
// Module: CIFAR-Ten HTTP Source
// Description: HTTP(S) archive source with host and address policy.
// Purpose: Stream the release archive over HTTP GET.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpArchiveSource`] opens `http://` and `https://` URLs as byte streams.
//! Non-success status codes fail closed.
//! Invariants:
//! - Plain `http` is rejected unless the policy allows it.
//! - Host policy checks run before any request is sent.
//! - Redirects are rejected.
//! - DNS resolution is pinned per request and re-validated before the stream
//!   is handed out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Host;
use url::Url;

use crate::source::ArchiveSource;
use crate::source::SourceError;
use crate::source::SourceStream;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Connection timeout for archive requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default end-to-end timeout for an archive transfer.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// ============================================================================
// SECTION: Download Policy
// ============================================================================

/// Transport and host policy for HTTP downloads.
///
/// # Invariants
/// - Private/link-local IPs are denied unless explicitly allowed.
/// - When an allowlist is set, only matching hosts are contacted.
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    /// Whether plain `http` URLs are accepted.
    allow_http: bool,
    /// Whether private and link-local IP ranges are allowed.
    allow_private_networks: bool,
    /// Optional allowlist of hosts.
    allowlist: Option<Vec<HostPattern>>,
    /// End-to-end transfer timeout.
    timeout: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            allow_http: false,
            allow_private_networks: false,
            allowlist: None,
            timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

impl DownloadPolicy {
    /// Creates the default policy (https only, public hosts only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts plain `http` URLs.
    #[must_use]
    pub const fn allow_http(mut self) -> Self {
        self.allow_http = true;
        self
    }

    /// Allows requests to private/link-local IP ranges.
    #[must_use]
    pub const fn allow_private_networks(mut self) -> Self {
        self.allow_private_networks = true;
        self
    }

    /// Replaces the allowlist with the provided hosts.
    #[must_use]
    pub fn allow_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowlist =
            Some(hosts.into_iter().filter_map(|host| HostPattern::parse(host.as_ref())).collect());
        self
    }

    /// Sets the end-to-end transfer timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the URL against the policy and resolves host IPs.
    fn resolve_request(&self, url: &Url) -> Result<ResolvedHost, SourceError> {
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(SourceError::Policy("plain http downloads are disabled".to_string()));
            }
            scheme => return Err(SourceError::UnsupportedScheme(scheme.to_string())),
        }
        let host = url.host().ok_or_else(|| SourceError::InvalidUri("missing host".to_string()))?;
        let host_label = normalize_host_label(&host);
        if let Some(allowlist) = &self.allowlist {
            if !allowlist.iter().any(|pattern| pattern.matches(&host_label)) {
                return Err(SourceError::Policy(format!("host not in allowlist: {host_label}")));
            }
        }
        let port = url.port_or_known_default().ok_or_else(|| {
            SourceError::InvalidUri("missing port for host resolution".to_string())
        })?;
        let mut ips = resolve_host_ips(&host, port)?;
        if ips.is_empty() {
            return Err(SourceError::Policy(format!("host has no resolved IPs: {host_label}")));
        }
        for ip in &ips {
            self.enforce_ip_policy(&host_label, *ip)?;
        }
        dedupe_ips(&mut ips);
        Ok(ResolvedHost {
            host_label,
            host: owned_host(&host),
            port,
            ips,
        })
    }

    /// Validates a peer IP against the policy.
    fn enforce_ip_policy(&self, host_label: &str, ip: IpAddr) -> Result<(), SourceError> {
        if self.allow_private_networks {
            return Ok(());
        }
        if is_private_or_link_local(&ip) {
            return Err(SourceError::Policy(format!(
                "host resolves to private or link-local address: {host_label}"
            )));
        }
        Ok(())
    }
}

/// Host allow pattern.
#[derive(Debug, Clone)]
enum HostPattern {
    /// Exact host match.
    Exact(String),
    /// Wildcard suffix match (for example: *.toronto.edu).
    WildcardSuffix(String),
}

impl HostPattern {
    /// Parses a host pattern string into a normalized matcher.
    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = normalize_host_string(trimmed);
        if let Some(suffix) = normalized.strip_prefix("*.") {
            if suffix.is_empty() {
                return None;
            }
            return Some(Self::WildcardSuffix(suffix.to_string()));
        }
        Some(Self::Exact(normalized))
    }

    /// Returns true when the pattern matches the provided host.
    fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(value) => host == value,
            Self::WildcardSuffix(suffix) => {
                if host.len() <= suffix.len() || !host.ends_with(suffix.as_str()) {
                    return false;
                }
                let boundary = host.len() - suffix.len() - 1;
                host.as_bytes().get(boundary) == Some(&b'.')
            }
        }
    }
}

/// Normalizes a host label into a lowercase string for matching.
fn normalize_host_label(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => normalize_host_string(domain),
        Host::Ipv4(ip) => ip.to_string(),
        Host::Ipv6(ip) => ip.to_string(),
    }
}

/// Normalizes raw host strings by trimming trailing dots and brackets.
fn normalize_host_string(host: &str) -> String {
    let trimmed = host.trim_end_matches('.');
    let trimmed =
        trimmed.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')).unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// Resolves hostnames to IP addresses for private-range validation.
fn resolve_host_ips(host: &Host<&str>, port: u16) -> Result<Vec<IpAddr>, SourceError> {
    match host {
        Host::Ipv4(ip) => Ok(vec![IpAddr::V4(*ip)]),
        Host::Ipv6(ip) => Ok(vec![IpAddr::V6(*ip)]),
        Host::Domain(domain) => (*domain, port)
            .to_socket_addrs()
            .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<IpAddr>>())
            .map_err(|err| SourceError::Policy(format!("dns lookup failed: {err}"))),
    }
}

/// Converts a host reference into an owned host.
fn owned_host(host: &Host<&str>) -> Host<String> {
    match host {
        Host::Domain(domain) => Host::Domain((*domain).to_string()),
        Host::Ipv4(ip) => Host::Ipv4(*ip),
        Host::Ipv6(ip) => Host::Ipv6(*ip),
    }
}

/// Removes duplicate IPs while preserving order.
fn dedupe_ips(ips: &mut Vec<IpAddr>) {
    let mut unique = Vec::with_capacity(ips.len());
    for ip in ips.drain(..) {
        if !unique.contains(&ip) {
            unique.push(ip);
        }
    }
    *ips = unique;
}

/// Returns true if the IP is private, link-local, loopback, or unspecified.
fn is_private_or_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => {
            addr.is_private()
                || addr.is_loopback()
                || addr.is_link_local()
                || addr.is_unspecified()
                || addr.is_multicast()
                || addr.is_broadcast()
        }
        IpAddr::V6(addr) => {
            let mapped_private = addr.to_ipv4_mapped().is_some_and(|mapped| {
                mapped.is_private()
                    || mapped.is_loopback()
                    || mapped.is_link_local()
                    || mapped.is_unspecified()
                    || mapped.is_multicast()
                    || mapped.is_broadcast()
            });
            let segments = addr.segments();
            // fc00::/7 unique local, fe80::/10 link local.
            let unique_local = (segments[0] & 0xfe00) == 0xfc00;
            let link_local = (segments[0] & 0xffc0) == 0xfe80;
            mapped_private
                || unique_local
                || link_local
                || addr.is_loopback()
                || addr.is_unspecified()
                || addr.is_multicast()
        }
    }
}

// ============================================================================
// SECTION: HTTP Source
// ============================================================================

/// HTTP-backed archive source.
///
/// # Invariants
/// - Redirects are rejected.
/// - Host policy is enforced on each request with pinned DNS resolution.
#[derive(Debug, Clone)]
pub struct HttpArchiveSource {
    /// HTTP client used for IP-literal hosts.
    client: Client,
    /// Policy enforcement for outbound requests.
    policy: DownloadPolicy,
}

impl HttpArchiveSource {
    /// Builds an HTTP source with the default policy.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_policy(DownloadPolicy::default())
    }

    /// Builds an HTTP source with a specific policy.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn with_policy(policy: DownloadPolicy) -> Result<Self, SourceError> {
        let client = base_client(&policy)
            .build()
            .map_err(|err| SourceError::Http(err.to_string()))?;
        Ok(Self {
            client,
            policy,
        })
    }

    /// Builds a client pinned to the provided IP when required.
    fn client_for_ip(&self, resolved: &ResolvedHost, ip: IpAddr) -> Result<Client, SourceError> {
        let socket_addr = SocketAddr::new(ip, resolved.port);
        match &resolved.host {
            Host::Domain(domain) => base_client(&self.policy)
                .resolve(domain.as_str(), socket_addr)
                .build()
                .map_err(|err| SourceError::Http(err.to_string())),
            Host::Ipv4(_) | Host::Ipv6(_) => Ok(self.client.clone()),
        }
    }
}

impl ArchiveSource for HttpArchiveSource {
    fn open(&self, url: &Url) -> Result<SourceStream, SourceError> {
        let resolved = self.policy.resolve_request(url)?;

        let mut last_error = None;
        for ip in resolved.ips.iter().copied() {
            let client = match self.client_for_ip(&resolved, ip) {
                Ok(client) => client,
                Err(err) => {
                    last_error = Some(err);
                    continue;
                }
            };
            let response = match client.get(url.as_str()).send() {
                Ok(response) => response,
                Err(err) => {
                    last_error = Some(SourceError::Http(err.to_string()));
                    continue;
                }
            };
            if response.url() != url {
                return Err(SourceError::Http(format!(
                    "redirected from {} to {}",
                    url,
                    response.url()
                )));
            }
            if !response.status().is_success() {
                return Err(SourceError::Http(format!("http status {}", response.status())));
            }
            // Re-validate the pinned peer IP before accepting the response.
            self.policy.enforce_ip_policy(&resolved.host_label, ip)?;

            let content_length = response.content_length();
            return Ok(SourceStream {
                reader: Box::new(response),
                content_length,
            });
        }

        Err(last_error.unwrap_or_else(|| {
            SourceError::Http("request failed for all resolved IPs".to_string())
        }))
    }
}

/// Returns a client builder carrying the policy's transport settings.
fn base_client(policy: &DownloadPolicy) -> reqwest::blocking::ClientBuilder {
    Client::builder()
        .redirect(Policy::none())
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(policy.timeout)
}

// ============================================================================
// SECTION: Resolved Host
// ============================================================================

/// Resolved host metadata for pinned HTTP requests.
///
/// # Invariants
/// - `ips` is non-empty and contains unique entries.
/// - `port` is the effective request port.
struct ResolvedHost {
    /// Normalized host label used for policy reporting.
    host_label: String,
    /// Resolved host for request construction.
    host: Host<String>,
    /// Effective port for the request.
    port: u16,
    /// Resolved IPs for the host.
    ips: Vec<IpAddr>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
