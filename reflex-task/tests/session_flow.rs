use rand::rngs::StdRng;
use rand::SeedableRng;
use reflex_core::{color, Color, EventSource, InputEvent, TrialSpec};
use reflex_render::NullCanvas;
use reflex_task::{ChoiceRunner, SessionConfig, SessionController, Stage, TrialRunner};
use reflex_timing::ManualClock;
use std::collections::HashMap;
use std::time::Duration;

/// Simulated participant: cycles through `keys` on every poll until
/// `keys_until` passes, and raises the quit signal once at `quit_at`.
struct Participant {
    clock: ManualClock,
    keys: Vec<char>,
    next: usize,
    keys_until: Option<Duration>,
    quit_at: Option<Duration>,
    quit_sent: bool,
}

impl Participant {
    fn new(clock: ManualClock, keys: Vec<char>) -> Self {
        Self {
            clock,
            keys,
            next: 0,
            keys_until: None,
            quit_at: None,
            quit_sent: false,
        }
    }

    fn keys_until(mut self, until: Duration) -> Self {
        self.keys_until = Some(until);
        self
    }

    fn quit_at(mut self, at: Duration) -> Self {
        self.quit_at = Some(at);
        self
    }
}

impl EventSource for Participant {
    fn poll(&mut self) -> Option<InputEvent> {
        let now = self.clock.peek();
        if let Some(at) = self.quit_at {
            if now >= at && !self.quit_sent {
                self.quit_sent = true;
                return Some(InputEvent::Quit);
            }
        }
        if self.quit_sent {
            return None;
        }
        if let Some(until) = self.keys_until {
            if now >= until {
                return None;
            }
        }
        if self.keys.is_empty() {
            return None;
        }
        let ch = self.keys[self.next % self.keys.len()];
        self.next += 1;
        Some(InputEvent::Key(ch))
    }
}

fn palette() -> HashMap<String, Color> {
    [
        ("Red".to_string(), color::RED),
        ("Green".to_string(), color::GREEN),
        ("Blue".to_string(), color::BLUE),
        ("Yellow".to_string(), color::YELLOW),
    ]
    .into_iter()
    .collect()
}

fn session_config(save_path: &std::path::Path) -> SessionConfig {
    SessionConfig {
        session_id: "P100".into(),
        condition: "Hard".into(),
        save_path: save_path.into(),
        // Points nowhere on purpose: the instructions screen degrades to
        // a logged skip, which keeps these sessions headless.
        instructions: save_path.join("missing-instructions.png"),
        ..SessionConfig::default()
    }
}

fn hard_specs() -> Vec<TrialSpec> {
    vec![
        TrialSpec::new("Red", "Hard", 'u', 2),
        TrialSpec::new("Green", "Hard", 'u', 1),
        TrialSpec::new("Blue", "Hard", 'u', 0),
        TrialSpec::new("Yellow", "Hard", 'u', -1),
    ]
}

#[test]
fn completed_session_records_every_trial_in_order() {
    let clock = ManualClock::new(Duration::from_millis(20));
    let participant = Participant::new(clock.clone(), vec!['u', ' ', 'q']);
    let dir = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        blocks: 2,
        trials_per_block: 4,
        trial_feedback: true,
        block_feedback: true,
        ..session_config(dir.path())
    };

    let stage = Stage::new(NullCanvas::new(1024, 768), participant, clock);
    let mut session = SessionController::new(
        stage,
        StdRng::seed_from_u64(42),
        ChoiceRunner::new(palette()),
        cfg,
        hard_specs(),
    );
    session.run_session();

    assert!(!session.state().quit);
    assert_eq!(session.state().current_block, 2);
    assert_eq!(session.store().len(), 8);

    let trials: Vec<u64> = session.store().records().iter().map(|r| r.trial).collect();
    assert_eq!(trials, (1..=8).collect::<Vec<u64>>());
    assert!(session.store().records().iter().all(|r| r.acc == "Correct"));
    assert!(session.store().records().iter().all(|r| r.resp == "u"));

    // The runner's lists were reset at block two, so the final stats
    // cover exactly the last block's four trials.
    assert_eq!(session.runner().block_rt().len(), 4);
    let stats = session.runner().block_stats();
    assert_eq!(stats.accuracy_pct, 100);
    let last_block: Vec<u64> = session
        .store()
        .records()
        .iter()
        .filter(|r| r.block == 2)
        .map(|r| r.rt)
        .collect();
    assert_eq!(last_block.len(), 4);
    assert_eq!(stats.mean_rt_ms, last_block.iter().sum::<u64>() / 4);

    let mut reader = csv::Reader::from_path(session.store().path()).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 21);
    assert_eq!(reader.records().count(), 8);
}

#[test]
fn foreign_condition_specs_do_not_advance_the_counter() {
    let clock = ManualClock::new(Duration::from_millis(20));
    let participant = Participant::new(clock.clone(), vec!['u', ' ', 'q']);
    let dir = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        blocks: 1,
        trials_per_block: 3,
        trial_feedback: false,
        block_feedback: false,
        ..session_config(dir.path())
    };
    let specs = vec![
        TrialSpec::new("Red", "Hard", 'u', 0),
        TrialSpec::new("Red", "Easy", 'u', 0),
        TrialSpec::new("Blue", "Hard", 'u', 0),
    ];

    let stage = Stage::new(NullCanvas::new(1024, 768), participant, clock);
    let mut session = SessionController::new(
        stage,
        StdRng::seed_from_u64(7),
        ChoiceRunner::new(palette()),
        cfg,
        specs,
    );
    session.run_session();

    assert_eq!(session.store().len(), 2);
    assert_eq!(session.state().current_trial, 2);
    let trials: Vec<u64> = session.store().records().iter().map(|r| r.trial).collect();
    assert_eq!(trials, vec![1, 2]);
}

#[test]
fn unanswered_session_scores_zero_without_dividing() {
    let clock = ManualClock::new(Duration::from_millis(20));
    // 'q' is never an accepted response key, so every target times out;
    // it only serves to leave the closing screen.
    let participant = Participant::new(clock.clone(), vec!['q']);
    let dir = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        blocks: 1,
        trials_per_block: 2,
        trial_feedback: false,
        block_feedback: false,
        ..session_config(dir.path())
    };
    let specs = vec![
        TrialSpec::new("Red", "Hard", 'u', 0),
        TrialSpec::new("Blue", "Hard", 'o', 0),
    ];

    let stage = Stage::new(NullCanvas::new(1024, 768), participant, clock);
    let mut session = SessionController::new(
        stage,
        StdRng::seed_from_u64(7),
        ChoiceRunner::new(palette()),
        cfg,
        specs,
    );
    session.run_session();

    assert!(!session.state().quit);
    assert_eq!(session.store().len(), 2);
    for record in session.store().records() {
        assert_eq!(record.acc, "Incorrect");
        assert_eq!(record.resp, "");
        assert!(record.rt >= 6000);
    }
    let stats = session.runner().block_stats();
    assert_eq!(stats.mean_rt_ms, 0);
    assert_eq!(stats.accuracy_pct, 0);
}

#[test]
fn quit_mid_trial_keeps_earlier_records_and_skips_the_rest() {
    let clock = ManualClock::new(Duration::from_millis(20));
    // Responds to the first trial, goes silent, then force-quits while
    // the second trial's target is still on screen.
    let participant = Participant::new(clock.clone(), vec!['u'])
        .keys_until(Duration::from_secs(3))
        .quit_at(Duration::from_secs(8));
    let dir = tempfile::tempdir().unwrap();
    let cfg = SessionConfig {
        blocks: 2,
        trials_per_block: 2,
        trial_feedback: false,
        block_feedback: false,
        ..session_config(dir.path())
    };
    let specs = vec![
        TrialSpec::new("Red", "Hard", 'u', 0),
        TrialSpec::new("Blue", "Hard", 'u', 0),
    ];

    let stage = Stage::new(NullCanvas::new(1024, 768), participant, clock);
    let mut session = SessionController::new(
        stage,
        StdRng::seed_from_u64(11),
        ChoiceRunner::new(palette()),
        cfg,
        specs,
    );
    session.run_session();

    assert!(session.state().quit);
    assert_eq!(session.state().current_block, 1);
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.store().records()[0].trial, 1);

    // The flush still happened and holds exactly the surviving trial.
    let contents = std::fs::read_to_string(session.store().path()).unwrap();
    assert_eq!(contents.lines().count(), 2);
}
