//! Executes a parsed request through the caller-selected strategy.
//!
//! # Design
//! Each execution is split the same way for every strategy: `build` turns
//! the descriptor into the `HttpRequest` actually put on the wire, a
//! `Transport` performs exactly one round trip, and `parse` folds the
//! `HttpResponse` into a `TransportOutcome`. Only `execute` touches the
//! network, so `build` and `parse` stay deterministic and unit-testable.
//!
//! `Dispatcher` holds immutable configuration and a shared transport. It
//! keeps nothing between calls and is safe to use from several threads.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::error::{SendError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::strategy::StrategyKind;
use crate::types::{RelayRequest, RelayResponse, RequestDescriptor, TransportOutcome};

/// Characters left unescaped when a URL is embedded as a query component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Performs a single HTTP round trip.
///
/// Implementations must return any HTTP status, including 4xx/5xx, as a
/// normal `HttpResponse`. Only failures where no response was obtained are
/// errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let sent = match &request.body {
            Some(body) => {
                let built = builder
                    .body(body.clone())
                    .map_err(|e| SendError::InvalidRequest(e.to_string()))?;
                self.agent.run(built)
            }
            None => {
                let built = builder
                    .body(())
                    .map_err(|e| SendError::InvalidRequest(e.to_string()))?;
                self.agent.run(built)
            }
        };
        let mut response = sent.map_err(classify_ureq_error)?;

        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| SendError::Network(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn classify_ureq_error(error: ureq::Error) -> SendError {
    match error {
        ureq::Error::Http(_) | ureq::Error::BadUri(_) => SendError::InvalidRequest(error.to_string()),
        other => SendError::Network(other.to_string()),
    }
}

/// Stateless executor for parsed requests.
#[derive(Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl Dispatcher {
    /// Dispatcher over a `ureq` transport honouring `config.timeout`.
    pub fn new(config: DispatchConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: DispatchConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Status line shown while a request is in flight.
    pub fn describe(descriptor: &RequestDescriptor, strategy: StrategyKind) -> String {
        format!(
            "Executing {} {} (via {strategy})",
            descriptor.method, descriptor.url
        )
    }

    /// Execute `descriptor` with one network round trip.
    ///
    /// Errors only when no usable response was obtained. Remote error
    /// statuses come back as an outcome with `ok == false`.
    pub fn execute(
        &self,
        descriptor: &RequestDescriptor,
        strategy: StrategyKind,
    ) -> Result<TransportOutcome, TransportError> {
        let request = self.build(descriptor, strategy)?;
        debug!(
            %strategy,
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            has_body = request.body.is_some(),
            "dispatching request"
        );

        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(err) => {
                let err = match err {
                    SendError::Network(message) => TransportError::Network { strategy, message },
                    SendError::InvalidRequest(message) => TransportError::InvalidRequest(message),
                };
                warn!(%strategy, error = %err, "transport failure");
                return Err(err);
            }
        };

        let outcome = self.parse(strategy, response)?;
        info!(
            %strategy,
            status = outcome.status(),
            ok = outcome.ok(),
            bytes = outcome.body().len(),
            "request completed"
        );
        Ok(outcome)
    }

    /// The request actually sent for `strategy`.
    pub fn build(
        &self,
        descriptor: &RequestDescriptor,
        strategy: StrategyKind,
    ) -> Result<HttpRequest, TransportError> {
        match strategy {
            StrategyKind::Direct => Ok(forward(descriptor, descriptor.url.clone())),
            StrategyKind::LocalRelay => relay(descriptor, &self.config.local_relay_url),
            StrategyKind::HostedRelay => relay(descriptor, &self.config.hosted_relay_url),
            StrategyKind::OpaqueRewrite => Ok(HttpRequest {
                method: HttpMethod::Get,
                url: rewrite(&self.config.opaque_base, &descriptor.url),
                headers: Vec::new(),
                body: None,
            }),
            StrategyKind::PrefixRewrite => Ok(forward(
                descriptor,
                rewrite(&self.config.prefix_base, &descriptor.url),
            )),
        }
    }

    /// Normalise a raw response obtained under `strategy`.
    ///
    /// Relay responses are unwrapped and `ok` follows the inner status, not
    /// the relay's own.
    pub fn parse(
        &self,
        strategy: StrategyKind,
        response: HttpResponse,
    ) -> Result<TransportOutcome, TransportError> {
        if !strategy.is_relay() {
            return Ok(TransportOutcome::new(response.status, response.body));
        }
        let envelope: RelayResponse =
            serde_json::from_str(&response.body).map_err(|e| TransportError::Envelope {
                strategy,
                message: format!("HTTP {}: {e}", response.status),
            })?;
        Ok(TransportOutcome::new(envelope.status, envelope.body))
    }
}

/// Carry method, headers and body to `url`. GET and HEAD never get a body.
fn forward(descriptor: &RequestDescriptor, url: String) -> HttpRequest {
    let mut headers: Vec<(String, String)> = descriptor
        .headers
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    headers.sort();

    let body = descriptor
        .body
        .clone()
        .filter(|_| descriptor.method.allows_body());

    HttpRequest {
        method: descriptor.method.clone(),
        url,
        headers,
        body,
    }
}

fn relay(descriptor: &RequestDescriptor, endpoint: &str) -> Result<HttpRequest, TransportError> {
    let envelope = serde_json::to_string(&RelayRequest::from(descriptor))
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: endpoint.to_string(),
        headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        body: Some(envelope),
    })
}

fn rewrite(base: &str, target: &str) -> String {
    format!("{base}{}", utf8_percent_encode(target, URI_COMPONENT))
}
