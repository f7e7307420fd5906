//! Error types for the dispatcher and its configuration.
//!
//! # Design
//! Only genuine transport problems are errors. Remote 4xx/5xx statuses are
//! ordinary `TransportOutcome` values. The `Display` of `TransportError` is
//! the single human-readable message handed to the caller, advisory text
//! included.

use thiserror::Error;

use crate::diagnostics;
use crate::strategy::StrategyKind;

/// Errors returned by `Dispatcher::execute`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The network stack failed before an HTTP response was obtained (DNS,
    /// connection refused, timeout).
    #[error("{}", diagnostics::network_message(.strategy.clone(), .message))]
    Network {
        strategy: StrategyKind,
        message: String,
    },

    /// A relay answered, but not with a `{status, body}` envelope.
    #[error("{strategy} relay returned an invalid envelope: {message}")]
    Envelope {
        strategy: StrategyKind,
        message: String,
    },

    /// The HTTP stack refused to build the request (for example a header
    /// name with illegal characters).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Strategy in effect when the error occurred, when known.
    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            TransportError::Network { strategy, .. } | TransportError::Envelope { strategy, .. } => {
                Some(*strategy)
            }
            TransportError::InvalidRequest(_) => None,
        }
    }
}

/// A strategy name that matches no `StrategyKind`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

/// Errors raised while loading `DispatchConfig` from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} is not a whole number of seconds")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("invalid {var}: {value:?} must start with http:// or https://")]
    InvalidEndpoint { var: &'static str, value: String },
}

/// Failure reported by a `Transport` before any strategy context is added.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// No HTTP response was obtained.
    #[error("{0}")]
    Network(String),

    /// The request could not be constructed or encoded.
    #[error("{0}")]
    InvalidRequest(String),
}
