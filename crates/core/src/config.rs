//! Configuration

use serde::{Deserialize, Serialize};
use std::env;

use crate::types::{parse_bytes32, AccountId};

/// Default dispute window: 7 days
pub const DEFAULT_CHALLENGE_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Default number of events kept for observers
pub const DEFAULT_MAX_EVENTS: usize = 10_000;

/// Ledger configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    /// How long a submitted state stays disputable
    pub challenge_window_secs: u64,
    /// Only this account may resolve challenges when set
    pub resolver: Option<AccountId>,
    /// Oldest events are evicted past this many
    pub max_events: usize,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            challenge_window_secs: DEFAULT_CHALLENGE_WINDOW_SECS,
            resolver: None,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl RollupConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self {
            challenge_window_secs: env::var("CHALLENGE_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHALLENGE_WINDOW_SECS),
            resolver: env::var("RESOLVER_ADDRESS")
                .ok()
                .and_then(|s| parse_bytes32(&s)),
            max_events: env::var("MAX_EVENTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_EVENTS),
        }
    }

    /// Set the dispute window
    pub fn with_challenge_window(mut self, secs: u64) -> Self {
        self.challenge_window_secs = secs;
        self
    }

    /// Restrict resolution to `resolver`
    pub fn with_resolver(mut self, resolver: AccountId) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Cap the retained event log
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Whether `caller` may resolve challenges
    pub fn may_resolve(&self, caller: &AccountId) -> bool {
        self.resolver.map_or(true, |resolver| resolver == *caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_open() {
        let config = RollupConfig::default();
        assert_eq!(config.challenge_window_secs, 604_800);
        assert_eq!(config.max_events, DEFAULT_MAX_EVENTS);
        assert!(config.may_resolve(&[9u8; 32]));
    }

    #[test]
    fn test_resolver_restricts() {
        let config = RollupConfig::default().with_resolver([1u8; 32]);
        assert!(config.may_resolve(&[1u8; 32]));
        assert!(!config.may_resolve(&[2u8; 32]));
    }
}
