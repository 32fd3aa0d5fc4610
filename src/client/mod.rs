//! Instrumented API client
//!
//! Every call that gets a response from the server is recorded as exactly one
//! [`DiagnosticEvent`] in the injected [`EventLog`]. Transport failures are
//! returned to the caller without an event.

pub mod base;
pub mod error;
pub mod id;
pub mod transport;

pub use base::{PageLocation, resolve_for_location};
pub use error::ApiError;

use transport::{OutboundRequest, Transport, UreqTransport};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::devlog::{DiagnosticEvent, EventLog, Method};

/// Per-call options. Headers are merged over the defaults; the method is fixed
/// by the call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

pub struct HttpClient {
    base_url: String,
    log: Arc<EventLog>,
    transport: Box<dyn Transport>,
}

impl HttpClient {
    /// Client over the default ureq transport
    pub fn new(base_url: impl Into<String>, log: Arc<EventLog>) -> Self {
        Self::with_transport(base_url, log, Box::new(UreqTransport::new()))
    }

    pub fn with_transport(base_url: impl Into<String>, log: Arc<EventLog>, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            log,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a root-relative path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, options: Option<RequestOptions>) -> Result<T, ApiError> {
        self.execute(Method::Get, path, None, options.unwrap_or_default())
    }

    pub fn post<B, T>(&self, path: &str, body: &B, options: Option<RequestOptions>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_string(body).map_err(ApiError::Serialize)?;
        self.execute(Method::Post, path, Some(payload), options.unwrap_or_default())
    }

    fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<String>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = OutboundRequest {
            method,
            url: self.url_for(path),
            headers: merge_headers(options.headers),
            body: payload,
        };
        let request_bytes = request.body.as_ref().map(|b| b.len());

        log::debug!("{} {}", method, request.url);
        let response = self.transport.send(&request).inspect_err(|e| {
            log::warn!("{} {} failed without a response: {}", method, request.url, e);
        })?;
        let duration_ms = response.elapsed.as_secs_f64() * 1000.0;

        if !response.is_ok() {
            self.record(&request, response.status, duration_ms, request_bytes, response.body.len());
            log::warn!("{} {} -> {} {}", method, request.url, response.status, response.status_text);
            return Err(ApiError::Request {
                status: response.status,
                status_text: response.status_text,
                body_text: response.body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            log::warn!("{} {} returned a body that is not JSON: {}", method, request.url, e);
            ApiError::Parse(e)
        })?;
        let response_bytes = serde_json::to_string(&value).map_err(ApiError::Parse)?.len();
        self.record(&request, response.status, duration_ms, request_bytes, response_bytes);
        log::debug!("{} {} -> {} in {:.1}ms", method, request.url, response.status, duration_ms);

        serde_json::from_value(value).map_err(ApiError::Parse)
    }

    fn record(
        &self,
        request: &OutboundRequest,
        status: u16,
        duration_ms: f64,
        request_bytes: Option<usize>,
        response_bytes: usize,
    ) {
        self.log.append(DiagnosticEvent {
            id: id::create_id(),
            timestamp: Utc::now().timestamp_millis(),
            method: request.method,
            url: request.url.clone(),
            status,
            duration_ms,
            request_bytes,
            response_bytes: Some(response_bytes),
        });
    }
}

/// Default JSON content type, overridden by caller headers with the same name
fn merge_headers(overrides: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    for (name, value) in overrides {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        headers.push((name, value));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::error::TransportError;
    use super::transport::RawResponse;
    use serde::Deserialize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted transport that remembers what it was asked to send
    struct FakeTransport {
        reply: Result<RawResponse, String>,
        sent: Arc<Mutex<Vec<OutboundRequest>>>,
    }

    impl FakeTransport {
        fn respond(status: u16, status_text: &str, body: &str) -> (Box<Self>, Arc<Mutex<Vec<OutboundRequest>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let transport = Box::new(Self {
                reply: Ok(RawResponse {
                    status,
                    status_text: status_text.to_string(),
                    body: body.to_string(),
                    elapsed: Duration::from_millis(25),
                }),
                sent: Arc::clone(&sent),
            });
            (transport, sent)
        }

        fn fail(message: &str) -> Box<Self> {
            Box::new(Self {
                reply: Err(message.to_string()),
                sent: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    impl Transport for FakeTransport {
        fn send(&self, request: &OutboundRequest) -> Result<RawResponse, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(TransportError::new)
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Health {
        status: String,
    }

    fn client_with(transport: Box<dyn Transport>) -> (HttpClient, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let client = HttpClient::with_transport("http://localhost:8080", Arc::clone(&log), transport);
        (client, log)
    }

    #[test]
    fn test_get_health_success_logs_one_event() {
        let (transport, sent) = FakeTransport::respond(200, "OK", r#"{"status":"ok"}"#);
        let (client, log) = client_with(transport);

        let health: Health = client.get("/health", None).unwrap();

        assert_eq!(health, Health { status: "ok".to_string() });
        let events = log.current();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].method, Method::Get);
        assert_eq!(events[0].status, 200);
        assert_eq!(events[0].url, "http://localhost:8080/health");
        assert!((events[0].duration_ms - 25.0).abs() < 1e-9);
        assert_eq!(events[0].request_bytes, None);
        assert_eq!(events[0].response_bytes, Some(r#"{"status":"ok"}"#.len()));
        assert!(!events[0].id.is_empty());

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].body, None);
        assert_eq!(
            sent[0].headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn test_post_store_error_logs_one_event() {
        let (transport, sent) = FakeTransport::respond(500, "Internal Server Error", "internal error");
        let (client, log) = client_with(transport);
        let body = serde_json::json!({
            "user_id": "u1",
            "history": [{"role": "user", "content": "hi"}]
        });
        let payload_len = serde_json::to_string(&body).unwrap().len();

        let err = client
            .post::<_, serde_json::Value>("/v1/store", &body, None)
            .unwrap_err();

        match err {
            ApiError::Request {
                status,
                status_text,
                body_text,
            } => {
                assert_eq!(status, 500);
                assert_eq!(status_text, "Internal Server Error");
                assert_eq!(body_text, "internal error");
            }
            other => panic!("expected request error, got {:?}", other),
        }

        let events = log.current();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].method, Method::Post);
        assert_eq!(events[0].status, 500);
        assert_eq!(events[0].request_bytes, Some(payload_len));
        assert_eq!(events[0].response_bytes, Some(14));

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].body.as_ref().map(|b| b.len()), Some(payload_len));
    }

    #[test]
    fn test_undecodable_error_body_still_logs_one_event() {
        let (transport, _) = FakeTransport::respond(500, "Internal Server Error", "\u{fffd}\u{fffd}\u{0}A");
        let (client, log) = client_with(transport);

        let err = client.get::<serde_json::Value>("/health", None).unwrap_err();

        assert!(matches!(err, ApiError::Request { status: 500, .. }));
        let events = log.current();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, 500);
        assert_eq!(events[0].response_bytes, Some("\u{fffd}\u{fffd}\u{0}A".len()));
    }

    #[test]
    fn test_post_success_records_request_bytes() {
        let (transport, _) = FakeTransport::respond(200, "OK", r#"{ "memories_created": 2 }"#);
        let (client, log) = client_with(transport);

        let value: serde_json::Value = client.post("/v1/store", &serde_json::json!({"a": 1}), None).unwrap();

        assert_eq!(value["memories_created"], 2);
        let events = log.current();
        assert_eq!(events[0].request_bytes, Some(r#"{"a":1}"#.len()));
        // measured on the re-serialized value, not the raw text
        assert_eq!(events[0].response_bytes, Some(r#"{"memories_created":2}"#.len()));
    }

    #[test]
    fn test_network_failure_logs_nothing() {
        let (client, log) = client_with(FakeTransport::fail("connection refused"));

        let err = client.get::<Health>("/health", None).unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error_without_event() {
        let (transport, _) = FakeTransport::respond(200, "OK", "<html>proxy page</html>");
        let (client, log) = client_with(transport);

        let err = client.get::<Health>("/health", None).unwrap_err();

        assert!(matches!(err, ApiError::Parse(_)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_parse_error_after_event() {
        let (transport, _) = FakeTransport::respond(200, "OK", r#"{"healthy":true}"#);
        let (client, log) = client_with(transport);

        let err = client.get::<Health>("/health", None).unwrap_err();

        assert!(matches!(err, ApiError::Parse(_)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_caller_headers_win() {
        let (transport, sent) = FakeTransport::respond(200, "OK", "{}");
        let (client, _) = client_with(transport);
        let options = RequestOptions {
            headers: vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ],
        };

        let _: serde_json::Value = client.get("/health", Some(options)).unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(
            sent[0].headers,
            vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("X-Trace".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_path_appended_verbatim() {
        let (transport, sent) = FakeTransport::respond(200, "OK", "[]");
        let log = Arc::new(EventLog::new());
        let client = HttpClient::with_transport("https://app.example.com/api", log, transport);

        let _: Vec<serde_json::Value> = client.get("/v1/retrieve?user_id=u1&limit=10", None).unwrap();

        assert_eq!(
            sent.lock().unwrap()[0].url,
            "https://app.example.com/api/v1/retrieve?user_id=u1&limit=10"
        );
    }

    #[test]
    fn test_events_accumulate_newest_first() {
        let (transport, _) = FakeTransport::respond(200, "OK", "{}");
        let (client, log) = client_with(transport);

        let _: serde_json::Value = client.get("/first", None).unwrap();
        let _: serde_json::Value = client.get("/second", None).unwrap();

        let urls: Vec<_> = log.current().into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec!["http://localhost:8080/second", "http://localhost:8080/first"]
        );
    }

    #[test]
    fn test_subscriber_panic_does_not_fail_request() {
        let (transport, _) = FakeTransport::respond(200, "OK", r#"{"status":"ok"}"#);
        let (client, log) = client_with(transport);
        let _sub = log.subscribe(|events| {
            if !events.is_empty() {
                panic!("console render failed");
            }
        });

        let health: Health = client.get("/health", None).unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(log.len(), 1);
    }
}
