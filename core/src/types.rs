//! Domain DTOs: the parsed request, the normalised outcome, and the relay
//! envelope.
//!
//! # Design
//! The envelope types mirror the relay-server's schema but are defined
//! independently. Integration tests catch any schema drift between the two
//! crates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics;
use crate::http::HttpMethod;

/// A structured request extracted from a raw command.
///
/// An empty `url` is a recoverable condition the caller must check with
/// [`RequestDescriptor::has_url`]; the parser never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl RequestDescriptor {
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Normalised result of one execution, whatever strategy carried it.
///
/// `ok` is always derived from `status`, so the fields are private and the
/// value cannot drift after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportOutcome {
    status: u16,
    ok: bool,
    body: String,
}

impl TransportOutcome {
    /// Sentinel status meaning no HTTP response was obtained.
    pub const NO_RESPONSE: u16 = 0;

    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            ok: (200..300).contains(&status),
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body pretty-printed when it is JSON, otherwise the raw text.
    pub fn pretty_body(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.body.clone())
    }

    /// One-line status text for the caller's status bar.
    pub fn summary(&self) -> String {
        if self.ok {
            return format!(
                "HTTP {} - Response loaded ({} bytes)",
                self.status,
                self.body.len()
            );
        }
        match diagnostics::outcome_hint(self) {
            Some(hint) => format!("HTTP {} - {hint}", self.status),
            None => format!("HTTP {}", self.status),
        }
    }
}

/// Payload POSTed to a relay: the descriptor, flattened to wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl From<&RequestDescriptor> for RelayRequest {
    fn from(descriptor: &RequestDescriptor) -> Self {
        Self {
            url: descriptor.url.clone(),
            method: descriptor.method.as_str().to_string(),
            headers: descriptor.headers.clone(),
            body: descriptor.body.clone(),
        }
    }
}

/// Envelope a relay answers with. `status` is the upstream status, not the
/// relay's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_tracks_2xx_range() {
        assert!(TransportOutcome::new(200, "").ok());
        assert!(TransportOutcome::new(204, "").ok());
        assert!(TransportOutcome::new(299, "").ok());
        assert!(!TransportOutcome::new(199, "").ok());
        assert!(!TransportOutcome::new(300, "").ok());
        assert!(!TransportOutcome::new(404, "").ok());
        assert!(!TransportOutcome::new(TransportOutcome::NO_RESPONSE, "").ok());
    }

    #[test]
    fn pretty_body_formats_json_and_passes_text_through() {
        let json = TransportOutcome::new(200, r#"{"a":1}"#);
        assert_eq!(json.pretty_body(), "{\n  \"a\": 1\n}");

        let text = TransportOutcome::new(200, "plain text");
        assert_eq!(text.pretty_body(), "plain text");
    }

    #[test]
    fn summary_reports_size_on_success() {
        let outcome = TransportOutcome::new(200, "hello");
        assert_eq!(outcome.summary(), "HTTP 200 - Response loaded (5 bytes)");
    }

    #[test]
    fn summary_on_failure_is_bare_status_without_hint() {
        let outcome = TransportOutcome::new(500, "boom");
        assert_eq!(outcome.summary(), "HTTP 500");
    }

    #[test]
    fn relay_request_serializes_null_body() {
        let descriptor = RequestDescriptor {
            url: "https://api.test/".to_string(),
            ..RequestDescriptor::default()
        };
        let value = serde_json::to_value(RelayRequest::from(&descriptor)).unwrap();
        assert_eq!(value["method"], "GET");
        assert!(value["body"].is_null());
        assert!(value["headers"].as_object().unwrap().is_empty());
    }

    #[test]
    fn descriptor_without_url_is_recoverable() {
        assert!(!RequestDescriptor::default().has_url());
    }
}
