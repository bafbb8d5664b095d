use crate::session::{SessionConfig, SessionState};
use crate::stage::Stage;
use crate::store::RecordStore;
use crate::unit::{CircleParams, StimulusKind, StimulusUnit, TextParams};
use chrono::Local;
use rand::Rng;
use reflex_core::{color, Color, EventSource, StopCondition, TrialOutcome, TrialRecord, TrialSpec};
use reflex_render::Canvas;
use reflex_timing::Clock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// How one call to `run_trial` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialRan {
    Completed,
    /// The trial belongs to another condition; nothing was counted.
    Skipped,
    /// The quit signal arrived; the session must stop.
    Aborted,
}

/// Per-block aggregates, recomputed fresh from the live lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Mean reaction time over correct responses only; 0 with none.
    pub mean_rt_ms: u64,
    /// Percent correct over all scored responses; 0 with none.
    pub accuracy_pct: u8,
}

/// Drives the fixed stimulus sequence for one trial and owns the block's
/// reaction-time and accuracy lists.
pub trait TrialRunner {
    /// Resets the per-block lists. Called at the start of every block.
    fn begin_block(&mut self);

    fn run_trial<C, E, K, R>(
        &mut self,
        stage: &mut Stage<C, E, K>,
        rng: &mut R,
        cfg: &SessionConfig,
        state: &mut SessionState,
        store: &mut RecordStore,
        spec: &TrialSpec,
    ) -> TrialRan
    where
        C: Canvas,
        E: EventSource,
        K: Clock,
        R: Rng;

    fn block_stats(&self) -> BlockStats;
}

/// Choice-task sequencer: fixation cross, colored target circle, optional
/// outcome feedback, jittered inter-trial interval.
pub struct ChoiceRunner {
    palette: HashMap<String, Color>,
    block_rt: Vec<u64>,
    block_acc: Vec<u8>,
}

impl ChoiceRunner {
    pub fn new(palette: HashMap<String, Color>) -> Self {
        Self {
            palette,
            block_rt: Vec::new(),
            block_acc: Vec::new(),
        }
    }

    pub fn block_rt(&self) -> &[u64] {
        &self.block_rt
    }

    pub fn block_acc(&self) -> &[u8] {
        &self.block_acc
    }

    fn stim_color(&self, stim: &str) -> Color {
        match self.palette.get(stim) {
            Some(color) => *color,
            None => {
                warn!("no palette entry for stimulus {stim:?}, using white");
                color::WHITE
            }
        }
    }

    fn build_record(
        &self,
        cfg: &SessionConfig,
        state: &SessionState,
        spec: &TrialSpec,
        scored: &TrialOutcome,
        screen: (u32, u32),
    ) -> TrialRecord {
        let now = Local::now();
        TrialRecord {
            date: now.format("%m-%d-%Y").to_string(),
            time: now.format("%I:%M:%S %p").to_string(),
            id: cfg.session_id.clone(),
            block: state.current_block,
            trial: state.current_trial,
            stim: spec.stim.clone(),
            xloc: spec.offset,
            cond: spec.condition.clone(),
            cresp: spec.key.to_string(),
            resp: scored.response.map_or(String::new(), |ch| ch.to_string()),
            rt: scored.rt_ms,
            acc: scored.label().to_string(),
            maxtrial: cfg.trials_per_block as u64,
            maxblock: cfg.blocks,
            trialfeedback: cfg.trial_feedback as u8,
            blockfeedback: cfg.block_feedback as u8,
            stimsize: cfg.stim_diameter,
            scrnwidth: screen.0,
            scrnheight: screen.1,
            version: ENGINE_VERSION.to_string(),
            tag: cfg.tag.clone(),
        }
    }
}

impl TrialRunner for ChoiceRunner {
    fn begin_block(&mut self) {
        self.block_rt.clear();
        self.block_acc.clear();
    }

    fn run_trial<C, E, K, R>(
        &mut self,
        stage: &mut Stage<C, E, K>,
        rng: &mut R,
        cfg: &SessionConfig,
        state: &mut SessionState,
        store: &mut RecordStore,
        spec: &TrialSpec,
    ) -> TrialRan
    where
        C: Canvas,
        E: EventSource,
        K: Clock,
        R: Rng,
    {
        if spec.condition != cfg.condition {
            return TrialRan::Skipped;
        }
        state.current_trial += 1;

        // Fixation cross; no response collected.
        let fixation = StimulusUnit::new(
            StimulusKind::Text(TextParams {
                font_size: 40.0,
                ..TextParams::new("+")
            }),
            StopCondition::time_limit(cfg.fixation),
        );
        if fixation.run(stage).quit {
            state.quit = true;
            return TrialRan::Aborted;
        }

        // Target stimulus; first accepted key or the ceiling ends it.
        let target = StimulusUnit::new(
            StimulusKind::Circle(CircleParams {
                radius: cfg.stim_diameter / 2,
                color: self.stim_color(&spec.stim),
                offset: spec.offset * cfg.stim_diameter as i32,
                ..CircleParams::default()
            }),
            StopCondition::keys_or_timeout(cfg.allowed.iter().copied(), cfg.response_ceiling),
        );
        let outcome = target.run(stage);
        if outcome.quit {
            state.quit = true;
            return TrialRan::Aborted;
        }

        let scored = TrialOutcome::judge(
            outcome.response,
            outcome.elapsed.unwrap_or_default(),
            spec.key,
        );
        if scored.correct {
            self.block_rt.push(scored.rt_ms);
        }
        self.block_acc.push(scored.correct as u8);

        if cfg.trial_feedback {
            let msg = format!("{}, RT = {} ms", scored.label(), scored.rt_ms);
            let feedback = StimulusUnit::new(
                StimulusKind::Text(TextParams {
                    font_size: 30.0,
                    ..TextParams::new(msg)
                }),
                StopCondition::keys_or_timeout([' '], cfg.feedback_limit),
            );
            if feedback.run(stage).quit {
                state.quit = true;
                return TrialRan::Aborted;
            }
        }

        let record = self.build_record(cfg, state, spec, &scored, stage.canvas.size());
        store.append(record);

        // Jittered pause so stimulus onset cannot be anticipated.
        let iti = Duration::from_secs_f64(rng.random_range(cfg.iti_range.0..cfg.iti_range.1));
        let pause = StimulusUnit::new(
            StimulusKind::Text(TextParams::new(" ")),
            StopCondition::time_limit(iti),
        );
        if pause.run(stage).quit {
            state.quit = true;
            return TrialRan::Aborted;
        }

        TrialRan::Completed
    }

    fn block_stats(&self) -> BlockStats {
        let mean_rt_ms = if self.block_rt.is_empty() {
            0
        } else {
            self.block_rt.iter().sum::<u64>() / self.block_rt.len() as u64
        };
        let accuracy_pct = if self.block_acc.is_empty() {
            0
        } else {
            let correct: u64 = self.block_acc.iter().map(|&a| a as u64).sum();
            (correct * 100 / self.block_acc.len() as u64) as u8
        };
        BlockStats {
            mean_rt_ms,
            accuracy_pct,
        }
    }
}
