use crate::runner::TrialRunner;
use crate::stage::Stage;
use crate::store::RecordStore;
use crate::unit::{ImageParams, StimulusKind, StimulusUnit, TextParams};
use rand::seq::SliceRandom;
use rand::Rng;
use reflex_core::{color, EventSource, StopCondition, TrialSpec};
use reflex_render::Canvas;
use reflex_timing::Clock;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Read-only session parameters, populated by the out-of-scope
/// parameter dialog or settings file before the run starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_id: String,
    /// Condition label; specs for any other condition are skipped.
    pub condition: String,
    /// The accepted response set for the target stimulus.
    pub allowed: Vec<char>,
    /// Instructions image shown before the first block.
    pub instructions: PathBuf,
    pub blocks: u32,
    pub trials_per_block: usize,
    pub trial_feedback: bool,
    pub block_feedback: bool,
    pub overwrite: bool,
    pub save_path: PathBuf,
    pub stim_diameter: u32,
    pub tag: String,
    pub fixation: Duration,
    pub response_ceiling: Duration,
    pub feedback_limit: Duration,
    /// Uniform jitter bounds for the inter-trial interval, in seconds.
    pub iti_range: (f64, f64),
    pub pre_block_pause: Duration,
    /// Polling-loop pacing; zero runs the loop uncapped.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: "participant".into(),
            condition: "Hard".into(),
            allowed: vec!['u', 'i', 'o', 'p'],
            instructions: PathBuf::from("instructions.png"),
            blocks: 4,
            trials_per_block: 32,
            trial_feedback: true,
            block_feedback: true,
            overwrite: false,
            save_path: PathBuf::from("."),
            stim_diameter: 50,
            tag: "Default".into(),
            fixation: Duration::from_millis(500),
            response_ceiling: Duration::from_secs(6),
            feedback_limit: Duration::from_secs(2),
            iti_range: (0.8, 1.3),
            pre_block_pause: Duration::from_secs(2),
            poll_interval: Duration::ZERO,
        }
    }
}

/// Mutable session counters, owned here and lent to the trial runner.
/// The trial counter is session-wide; block boundaries never reset it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_block: u32,
    pub current_trial: u64,
    pub quit: bool,
}

/// Sequences blocks and trials, aggregates block feedback, and flushes
/// the record store when the session ends, normally or by quit.
pub struct SessionController<C, E, K, R, T> {
    stage: Stage<C, E, K>,
    rng: R,
    runner: T,
    cfg: SessionConfig,
    trial_list: Vec<TrialSpec>,
    state: SessionState,
    store: RecordStore,
}

impl<C, E, K, R, T> SessionController<C, E, K, R, T>
where
    C: Canvas,
    E: EventSource,
    K: Clock,
    R: Rng,
    T: TrialRunner,
{
    pub fn new(
        mut stage: Stage<C, E, K>,
        rng: R,
        runner: T,
        cfg: SessionConfig,
        trial_list: Vec<TrialSpec>,
    ) -> Self {
        stage.poll_interval = cfg.poll_interval;
        let store = RecordStore::new(&cfg.save_path, &cfg.session_id, cfg.overwrite);
        Self {
            stage,
            rng,
            runner,
            cfg,
            trial_list,
            state: SessionState::default(),
            store,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn runner(&self) -> &T {
        &self.runner
    }

    /// Runs the whole session: instructions, every block, the data
    /// flush, and the closing screen unless the session was aborted.
    pub fn run_session(&mut self) {
        self.show_instructions();
        for _ in 0..self.cfg.blocks {
            self.run_block();
        }
        match self.store.flush() {
            Ok(path) => info!("data saved to {}", path.display()),
            Err(err) => error!("DATA LOSS: unable to save session data: {err:#}"),
        }
        if !self.state.quit {
            self.show_closing();
        }
    }

    fn run_block(&mut self) {
        self.runner.begin_block();
        if self.state.quit {
            return;
        }

        self.trial_list.shuffle(&mut self.rng);
        self.state.current_block += 1;
        info!(block = self.state.current_block, "block started");

        let pause = StimulusUnit::new(
            StimulusKind::Text(TextParams::new(" ")),
            StopCondition::time_limit(self.cfg.pre_block_pause),
        );
        if pause.run(&mut self.stage).quit {
            self.state.quit = true;
            return;
        }

        let specs = self.trial_list.clone();
        for spec in &specs {
            if self.state.quit {
                break;
            }
            self.runner.run_trial(
                &mut self.stage,
                &mut self.rng,
                &self.cfg,
                &mut self.state,
                &mut self.store,
                spec,
            );
        }

        if self.cfg.block_feedback && !self.state.quit {
            self.show_block_feedback();
        }
    }

    fn show_instructions(&mut self) {
        let unit = StimulusUnit::new(
            StimulusKind::Image(ImageParams {
                fullscreen: true,
                ..ImageParams::new(self.cfg.instructions.clone())
            }),
            StopCondition::keys([' ']),
        );
        if unit.run(&mut self.stage).quit {
            self.state.quit = true;
        }
    }

    fn show_block_feedback(&mut self) {
        let stats = self.runner.block_stats();
        let msg = format!(
            "Block Feedback [{} of {}]\n\
             ---------------------\n\
             Average Response Time: {} milliseconds.\n\
             \x20   Response Accuracy: {} percent.\n\n\n\n\n\n\
             Press SpaceBar To Start Next Block",
            self.state.current_block, self.cfg.blocks, stats.mean_rt_ms, stats.accuracy_pct
        );
        // Smaller type on small targets so the block doesn't overflow.
        let (width, _) = self.stage.canvas.size();
        let font_size = if width <= 800 { 32.0 } else { 40.0 };
        let unit = StimulusUnit::new(
            StimulusKind::Multiline(TextParams {
                font_size,
                color: color::CYAN,
                ..TextParams::new(msg)
            }),
            StopCondition::keys([' ']),
        );
        if unit.run(&mut self.stage).quit {
            self.state.quit = true;
        }
    }

    fn show_closing(&mut self) {
        let msg = "The Experiment is Over,\n\
                   Thanks for your Participation.\
                   \n\n\n\n\n\n\n\n\
                   Press Q to exit";
        let unit = StimulusUnit::new(
            StimulusKind::Multiline(TextParams {
                font_size: 32.0,
                ..TextParams::new(msg)
            }),
            StopCondition::keys(['q']),
        );
        unit.run(&mut self.stage);
    }
}
