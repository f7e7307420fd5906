//! Advisory text for failed executions.
//!
//! Classification only decorates messages. It never changes what the
//! dispatcher returns.

use crate::strategy::StrategyKind;
use crate::types::TransportOutcome;

const CROSS_ORIGIN_MARKERS: &[&str] = &["cors", "cross-origin", "failed to fetch", "networkerror"];

const LOCAL_RELAY_DOWN: &str = "local relay is not running. Start it with: relay-server";
const HOSTED_RELAY_DOWN: &str = "hosted relay may be unavailable. Try the local relay instead.";
const SWITCH_TO_RELAY: &str = "try the local or hosted relay strategy";
const CORS_BODY_HINT: &str = "Try the local relay (run relay-server first)";

/// Human-readable message for a network-level failure under `strategy`.
pub fn network_message(strategy: StrategyKind, message: &str) -> String {
    match network_hint(strategy, message) {
        Some(hint) => format!("{message} - {hint}"),
        None => message.to_string(),
    }
}

/// The advisory suffix for a network failure, if any applies.
pub fn network_hint(strategy: StrategyKind, message: &str) -> Option<&'static str> {
    match strategy {
        StrategyKind::LocalRelay => Some(LOCAL_RELAY_DOWN),
        StrategyKind::HostedRelay => Some(HOSTED_RELAY_DOWN),
        StrategyKind::Direct | StrategyKind::OpaqueRewrite | StrategyKind::PrefixRewrite => {
            mentions_cross_origin(message).then_some(SWITCH_TO_RELAY)
        }
    }
}

/// Hint for a non-2xx outcome whose body points at an origin restriction.
pub fn outcome_hint(outcome: &TransportOutcome) -> Option<&'static str> {
    if outcome.ok() || !outcome.body().contains("CORS") {
        return None;
    }
    Some(CORS_BODY_HINT)
}

fn mentions_cross_origin(message: &str) -> bool {
    let lower = message.to_lowercase();
    CROSS_ORIGIN_MARKERS.iter().any(|marker| lower.contains(marker))
}
