use std::time::Duration;

/// What a stimulus unit's `run` produced.
///
/// `response`/`elapsed` are both `None` exactly when parameter validation
/// failed and nothing was rendered. On a timeout the response is `None`
/// but the elapsed time is still reported, since time-limited units pace
/// the session with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitOutcome {
    pub response: Option<char>,
    pub elapsed: Option<Duration>,
    pub quit: bool,
}

impl UnitOutcome {
    /// Validation failed; the unit never ran.
    pub fn invalid() -> Self {
        Self {
            response: None,
            elapsed: None,
            quit: false,
        }
    }

    pub fn key(ch: char, elapsed: Duration) -> Self {
        Self {
            response: Some(ch),
            elapsed: Some(elapsed),
            quit: false,
        }
    }

    pub fn timeout(elapsed: Duration) -> Self {
        Self {
            response: None,
            elapsed: Some(elapsed),
            quit: false,
        }
    }

    pub fn quit(elapsed: Duration) -> Self {
        Self {
            response: None,
            elapsed: Some(elapsed),
            quit: true,
        }
    }

    pub fn timed_out(&self) -> bool {
        !self.quit && self.response.is_none() && self.elapsed.is_some()
    }
}

/// One trial, scored. Reaction time is truncated to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub response: Option<char>,
    pub rt_ms: u64,
    pub correct: bool,
}

impl TrialOutcome {
    /// Judges a unit result against the trial's correct key. A missing
    /// response (timeout) is never correct.
    pub fn judge(response: Option<char>, elapsed: Duration, correct_key: char) -> Self {
        Self {
            response,
            rt_ms: elapsed.as_millis() as u64,
            correct: response == Some(correct_key),
        }
    }

    pub fn label(&self) -> &'static str {
        if self.correct {
            "Correct"
        } else {
            "Incorrect"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_time_truncates() {
        let o = TrialOutcome::judge(Some('u'), Duration::from_micros(431_999), 'u');
        assert_eq!(o.rt_ms, 431);
        assert!(o.correct);
    }

    #[test]
    fn timeout_is_never_correct() {
        let o = TrialOutcome::judge(None, Duration::from_secs(6), 'u');
        assert!(!o.correct);
        assert_eq!(o.label(), "Incorrect");
    }

    #[test]
    fn wrong_key_is_incorrect_with_rt() {
        let o = TrialOutcome::judge(Some('i'), Duration::from_millis(512), 'u');
        assert!(!o.correct);
        assert_eq!(o.rt_ms, 512);
    }
}
