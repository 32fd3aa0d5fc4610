//! Diagnostic event record

use chrono::{Local, TimeZone};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of a recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded outcome of a single outbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// Opaque identifier, only meaningful as a list key
    pub id: String,
    /// Milliseconds since the Unix epoch, taken when the event is logged
    pub timestamp: i64,
    pub method: Method,
    /// Fully resolved URL sent over the wire
    pub url: String,
    pub status: u16,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_bytes: Option<usize>,
}

impl DiagnosticEvent {
    /// Local wall-clock time of the event, `HH:MM:SS`
    pub fn local_time(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(dt) => dt.format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Format for a single console line
    pub fn format_display(&self) -> String {
        let status = self.status.to_string();
        let status_colored = if self.is_success() {
            status.green()
        } else if self.status >= 500 {
            status.red()
        } else {
            status.yellow()
        };

        let method_colored = match self.method {
            Method::Get => self.method.as_str().cyan(),
            Method::Post => self.method.as_str().blue(),
        };

        format!(
            "{} {} {} {} {}",
            self.local_time().dimmed(),
            method_colored,
            status_colored,
            format!("{}ms", self.duration_ms.round() as u64).dimmed(),
            self.url
        )
    }
}
