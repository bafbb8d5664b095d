mod config;
mod font;
mod window;

use anyhow::Result;
use config::Settings;
use reflex_core::{color, Color};
use reflex_task::{ChoiceRunner, SessionConfig, SessionController, Stage};
use reflex_timing::MonotonicClock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

fn default_palette() -> HashMap<String, Color> {
    ["Red", "Green", "Blue", "Yellow"]
        .into_iter()
        .map(|name| (name.to_string(), color::named(name).unwrap_or(color::WHITE)))
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::settings_path);
    let mut settings = Settings::load(&settings_path);
    settings.block_trials = settings.rounded_trials();
    if settings.pid.trim().is_empty() {
        warn!("participant id is empty, using \"participant\"");
        settings.pid = "participant".into();
    }
    if !settings_path.exists() {
        if let Err(err) = settings.save(&settings_path) {
            warn!("unable to write settings template: {err:#}");
        }
    }

    let save_path = config::data_dir()?;
    let font = font::load_font(settings.font.as_deref())?;
    let (canvas, events) =
        window::open(settings.width, settings.height, settings.fullscreen, font)?;

    let instructions = settings
        .instructions
        .clone()
        .unwrap_or_else(|| save_path.join("instructions.png"));
    let trial_list = config::build_trial_list(&settings);
    let cfg = SessionConfig {
        session_id: settings.pid.trim().to_string(),
        condition: settings.condition.clone(),
        allowed: vec!['u', 'i', 'o', 'p'],
        instructions,
        blocks: settings.blocks,
        trials_per_block: settings.block_trials as usize,
        trial_feedback: settings.trial_feedback(),
        block_feedback: true,
        overwrite: settings.overwrite,
        save_path,
        stim_diameter: settings.diameter,
        tag: settings.tag.clone(),
        poll_interval: Duration::from_millis(settings.poll_interval_ms),
        ..SessionConfig::default()
    };

    info!(
        participant = %cfg.session_id,
        blocks = cfg.blocks,
        trials_per_block = cfg.trials_per_block,
        condition = %cfg.condition,
        "session starting"
    );

    let stage = Stage::new(canvas, events, MonotonicClock::new());
    let runner = ChoiceRunner::new(default_palette());
    let mut session = SessionController::new(stage, rand::rng(), runner, cfg, trial_list);
    session.run_session();

    if session.state().quit {
        info!("session aborted by quit signal");
    } else {
        info!("session complete, thanks for participating");
    }
    Ok(())
}
