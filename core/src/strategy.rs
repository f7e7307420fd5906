//! The closed set of ways a request can be carried to its target.

use std::fmt;
use std::str::FromStr;

use crate::error::UnknownStrategy;

/// How a request reaches its destination. Chosen by the caller per
/// execution, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// The caller's own network stack talks to the target directly.
    Direct,
    /// A relay process running next to the caller performs the call and
    /// answers with a `{status, body}` envelope.
    LocalRelay,
    /// Same envelope contract as `LocalRelay`, served by a hosted relay.
    HostedRelay,
    /// The target URL is embedded into a public raw-content relay. GET only;
    /// caller headers and body are dropped.
    OpaqueRewrite,
    /// The target URL is embedded into a public pass-through relay that
    /// forwards method, headers and body.
    PrefixRewrite,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Direct,
        StrategyKind::LocalRelay,
        StrategyKind::HostedRelay,
        StrategyKind::OpaqueRewrite,
        StrategyKind::PrefixRewrite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::LocalRelay => "local",
            StrategyKind::HostedRelay => "hosted",
            StrategyKind::OpaqueRewrite => "opaque",
            StrategyKind::PrefixRewrite => "prefix",
        }
    }

    /// Whether the response arrives wrapped in a relay envelope.
    pub fn is_relay(self) -> bool {
        matches!(self, StrategyKind::LocalRelay | StrategyKind::HostedRelay)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "none" => Ok(StrategyKind::Direct),
            "local" | "relay-a" => Ok(StrategyKind::LocalRelay),
            "hosted" | "cloud" | "relay-b" => Ok(StrategyKind::HostedRelay),
            "opaque" | "allorigins" => Ok(StrategyKind::OpaqueRewrite),
            "prefix" | "corsproxy" => Ok(StrategyKind::PrefixRewrite),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
