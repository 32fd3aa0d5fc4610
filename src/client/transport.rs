//! Network seam for the API client
//!
//! `HttpClient` never talks to ureq directly; it hands an
//! [`OutboundRequest`] to a [`Transport`] and gets back the status line and
//! body text. Tests swap in a scripted transport.

use std::time::{Duration, Instant};

use super::error::TransportError;
use crate::devlog::Method;

/// A fully prepared request
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Largest response body read into memory
pub const BODY_LIMIT: u64 = 16 * 1024 * 1024;

/// Status line and body of a received response
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
    /// Time from sending the request until the response head arrived
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can put a request on the wire
pub trait Transport: Send + Sync {
    /// Send the request and read the whole response body.
    ///
    /// Any status code is a successful send; only failures before the
    /// response head arrives are errors.
    fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Blocking transport backed by a ureq agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        // Non-2xx responses are data for the caller, not transport errors
        let config = ureq::Agent::config_builder().http_status_as_error(false).build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
        let start = Instant::now();
        let mut response = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            Method::Post => {
                let mut builder = self.agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(request.body.as_deref().unwrap_or_default().as_bytes())?
            }
        };
        let elapsed = start.elapsed();

        let status = response.status();
        let body = read_body(response.body_mut(), &request.url);

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
            elapsed,
        })
    }
}

/// Body text, decoded lossily. The server has already answered, so a body
/// that cannot be read in full is kept as far as it got.
fn read_body(body: &mut ureq::Body, url: &str) -> String {
    match body.with_config().limit(BODY_LIMIT).read_to_vec() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("Could not read response body from {}: {}", url, e);
            String::new()
        }
    }
}
