//! Cache key definitions.

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "subscription:";

/// Builds cache keys from the string form of a subscription id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionKeys {
    prefix: String,
}

impl Default for SubscriptionKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

impl SubscriptionKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, id: i64) -> String {
        format!("{}{id}", self.prefix)
    }
}
