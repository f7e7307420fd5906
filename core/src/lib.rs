//! Parse curl-style commands and execute them through interchangeable
//! transport strategies.
//!
//! # Overview
//! `command::parse` turns free-form command text into a `RequestDescriptor`
//! without ever failing. `Dispatcher::execute` carries that descriptor to its
//! target using the caller's `StrategyKind` and normalises whatever comes back
//! into a `TransportOutcome`.
//!
//! # Design
//! - Parsing is best-effort: unknown flags are dropped and a missing URL is an
//!   empty string the caller checks, not an error.
//! - Dispatch is split into `build` (plain-data request), one `Transport`
//!   round trip, and `parse` (normalisation), so every strategy is testable
//!   without a network.
//! - Remote 4xx/5xx statuses are outcomes. `TransportError` is reserved for
//!   failures where no usable response was obtained, and its `Display` carries
//!   the advisory text for the caller.
//! - Relay envelope DTOs are defined independently from the relay-server
//!   crate; integration tests catch schema drift.

pub mod command;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod strategy;
pub mod types;

pub use command::parse;
pub use config::DispatchConfig;
pub use dispatch::{Dispatcher, Transport, UreqTransport};
pub use error::{ConfigError, SendError, TransportError, UnknownStrategy};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use strategy::StrategyKind;
pub use types::{RelayRequest, RelayResponse, RequestDescriptor, TransportOutcome};
