use serde::{Deserialize, Serialize};

/// One trial's input, opaque to the session machinery: which stimulus to
/// show, which condition it belongs to, the single key that counts as
/// correct, and a normalized display offset (multiplied by the stimulus
/// size at presentation time).
///
/// Immutable once the block's trial list is built; the full list is
/// reused and re-shuffled for every block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub stim: String,
    pub condition: String,
    pub key: char,
    pub offset: i32,
}

impl TrialSpec {
    pub fn new(stim: impl Into<String>, condition: impl Into<String>, key: char, offset: i32) -> Self {
        Self {
            stim: stim.into(),
            condition: condition.into(),
            key,
            offset,
        }
    }
}
