use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Predicate set that ends a stimulus unit's polling loop.
///
/// An empty key set means no response is collected; a `None` time limit
/// means the unit never times out. With neither, the unit blocks until
/// the quit signal arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopCondition {
    pub keys: Vec<char>,
    pub time_limit: Option<Duration>,
}

impl StopCondition {
    /// No stopping condition at all; only the quit signal exits.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn keys(keys: impl IntoIterator<Item = char>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            time_limit: None,
        }
    }

    pub fn time_limit(limit: Duration) -> Self {
        Self {
            keys: Vec::new(),
            time_limit: Some(limit),
        }
    }

    pub fn keys_or_timeout(keys: impl IntoIterator<Item = char>, limit: Duration) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            time_limit: Some(limit),
        }
    }

    /// True when `ch` is in the accepted-response set.
    pub fn accepts(&self, ch: char) -> bool {
        self.keys.contains(&ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_set_accepts_nothing() {
        let stop = StopCondition::time_limit(Duration::from_secs(1));
        assert!(!stop.accepts('a'));
    }

    #[test]
    fn accepts_only_configured_keys() {
        let stop = StopCondition::keys(['u', 'i']);
        assert!(stop.accepts('u'));
        assert!(!stop.accepts('o'));
    }
}
