//! Local relay for callers that cannot reach a target directly.
//!
//! # Design
//! A POSTed envelope `{url, method, headers, body}` is replayed against the
//! target with a blocking `ureq` agent on tokio's blocking pool. The reply is
//! always HTTP 200 carrying `{status, body}` with the upstream status, so
//! 4xx/5xx from the target are data rather than relay failures. Upstream
//! network errors are folded into a `{status: 500, body: "Proxy error: ..."}`
//! envelope.
//!
//! `/echo` reflects the received request back as JSON and serves as a
//! round-trip fixture for clients.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, post, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8766;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope accepted from clients.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Envelope returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

/// What `/echo` saw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoReply {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] ureq::Error),

    #[error("invalid upstream request: {0}")]
    Request(#[from] ureq::http::Error),

    #[error("relay worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
struct RelayState {
    agent: ureq::Agent,
}

pub fn app() -> Router {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .allow_non_standard_methods(true)
        .timeout_global(Some(UPSTREAM_TIMEOUT))
        .build()
        .new_agent();

    Router::new()
        .route("/", relay_routes())
        .route("/api/proxy", relay_routes())
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .with_state(RelayState { agent })
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn relay_routes() -> MethodRouter<RelayState> {
    post(relay).options(preflight).fallback(method_not_allowed)
}

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

fn client_error(status: StatusCode, message: String) -> Response {
    (
        status,
        cors_headers(),
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

async fn method_not_allowed() -> Response {
    client_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed. Use POST.".to_string(),
    )
}

async fn relay(State(state): State<RelayState>, payload: Bytes) -> Response {
    let request: RelayRequest = match serde_json::from_slice(&payload) {
        Ok(request) => request,
        Err(e) => {
            return client_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {e}"));
        }
    };
    if request.url.trim().is_empty() {
        return client_error(
            StatusCode::BAD_REQUEST,
            "Missing 'url' in request body.".to_string(),
        );
    }

    let method = request.method.to_uppercase();
    let url = request.url.clone();
    let agent = state.agent.clone();
    let outcome = tokio::task::spawn_blocking(move || forward(&agent, &request))
        .await
        .map_err(ServerError::from)
        .and_then(|result| result);

    let envelope = match outcome {
        Ok(envelope) => {
            info!(%method, %url, status = envelope.status, "relayed");
            envelope
        }
        Err(e) => {
            warn!(%method, %url, error = %e, "upstream request failed");
            RelayResponse {
                status: 500,
                body: format!("Proxy error: {e}"),
            }
        }
    };

    (StatusCode::OK, cors_headers(), Json(envelope)).into_response()
}

/// Replay one envelope against its target.
///
/// The body is forwarded only when it is non-empty and the method is not
/// GET or HEAD.
fn forward(agent: &ureq::Agent, request: &RelayRequest) -> Result<RelayResponse, ServerError> {
    let method = request.method.to_uppercase();
    let mut builder = ureq::http::Request::builder()
        .method(method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let body = request
        .body
        .as_deref()
        .filter(|b| !b.is_empty() && method != "GET" && method != "HEAD");
    let mut response = match body {
        Some(body) => agent.run(builder.body(body.to_string())?)?,
        None => agent.run(builder.body(())?)?,
    };

    let status = response.status().as_u16();
    let bytes = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()?;
    Ok(RelayResponse {
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<EchoReply> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(EchoReply {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        headers,
        body,
    })
}
