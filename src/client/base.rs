//! API base address resolution

use eyre::{Context, Result};
use std::net::IpAddr;
use url::Url;

/// Port the API listens on when reached directly on a LAN host
pub const LAN_API_PORT: u16 = 8080;

/// Where the console is considered to be served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub scheme: String,
    pub host: String,
    pub origin: String,
}

impl PageLocation {
    /// Parse an origin such as `https://app.example.com`
    pub fn parse(origin: &str) -> Result<Self> {
        let url = Url::parse(origin).context(format!("Invalid origin URL: {}", origin))?;
        let host = url
            .host_str()
            .ok_or_else(|| eyre::eyre!("Origin URL has no host: {}", origin))?
            .to_string();

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            origin: url.origin().ascii_serialization(),
        })
    }
}

/// Check if a hostname is loopback or in an RFC1918 private range
pub fn is_lan_host(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => ip.is_loopback() || ip.is_private(),
        Ok(IpAddr::V6(ip)) => ip.is_loopback(),
        Err(_) => false,
    }
}

/// Resolve the base address every request path is appended to.
///
/// A non-blank explicit override wins. Otherwise LAN hosts talk to the API
/// directly on port 8080 and public hosts go through the same-origin `/api`
/// reverse proxy.
pub fn resolve_base_url(explicit: Option<&str>, host: &str, origin: &str, scheme: &str) -> String {
    if let Some(base) = explicit
        && !base.trim().is_empty()
    {
        return base.to_string();
    }

    if is_lan_host(host) {
        return format!("{}://{}:{}", scheme, host, LAN_API_PORT);
    }

    format!("{}/api", origin)
}

/// Resolve against a parsed [`PageLocation`]
pub fn resolve_for_location(explicit: Option<&str>, location: &PageLocation) -> String {
    resolve_base_url(explicit, &location.host, &location.origin, &location.scheme)
}
