//! Failed-login bookkeeping and the bot check that kicks in after repeated failures.

use async_trait::async_trait;
use dashmap::DashMap;

/// Failures after which the next attempt must pass a bot check
pub const CAPTCHA_THRESHOLD: u32 = 2;

/// Something that can tell a human from a script.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    async fn verify(&self, token: Option<&str>) -> bool;
}

/// Always passes. Stands in for a real captcha provider.
pub struct SimulatedHumanVerifier;

#[async_trait]
impl HumanVerifier for SimulatedHumanVerifier {
    async fn verify(&self, _token: Option<&str>) -> bool {
        true
    }
}

/// Per-identifier failure counters, shared across requests.
#[derive(Default)]
pub struct LoginGuard {
    attempts: DashMap<String, u32>,
}

impl LoginGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(identifier: &str) -> String {
        identifier.trim().to_lowercase()
    }

    pub fn failures(&self, identifier: &str) -> u32 {
        self.attempts
            .get(&Self::key(identifier))
            .map(|n| *n)
            .unwrap_or(0)
    }

    pub fn captcha_required(&self, identifier: &str) -> bool {
        self.failures(identifier) >= CAPTCHA_THRESHOLD
    }

    /// Returns the new failure count
    pub fn record_failure(&self, identifier: &str) -> u32 {
        let mut entry = self.attempts.entry(Self::key(identifier)).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn reset(&self, identifier: &str) {
        self.attempts.remove(&Self::key(identifier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captcha_after_two_failures() {
        let guard = LoginGuard::new();
        assert!(!guard.captcha_required("ana"));
        assert_eq!(guard.record_failure("ana"), 1);
        assert!(!guard.captcha_required("ana"));
        assert_eq!(guard.record_failure("ANA "), 2);
        assert!(guard.captcha_required("ana"));
    }

    #[test]
    fn reset_clears_only_that_identifier() {
        let guard = LoginGuard::new();
        guard.record_failure("ana");
        guard.record_failure("bob");
        guard.reset("ana");
        assert_eq!(guard.failures("ana"), 0);
        assert_eq!(guard.failures("bob"), 1);
    }

    #[tokio::test]
    async fn simulated_verifier_always_passes() {
        assert!(SimulatedHumanVerifier.verify(None).await);
        assert!(SimulatedHumanVerifier.verify(Some("anything")).await);
    }
}
