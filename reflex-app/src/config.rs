use anyhow::{Context, Result};
use directories::ProjectDirs;
use reflex_core::TrialSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Session settings, normally edited in the JSON settings file. Unknown
/// or missing fields fall back to defaults so older files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pid: String,
    pub blocks: u32,
    pub block_trials: u32,
    pub condition: String,
    /// "Practice" enables per-trial feedback; "Test" disables it.
    pub session_type: String,
    pub diameter: u32,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub overwrite: bool,
    pub tag: String,
    pub font: Option<PathBuf>,
    pub instructions: Option<PathBuf>,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pid: std::env::var("USER").unwrap_or_else(|_| "participant".into()),
            blocks: 4,
            block_trials: 32,
            condition: "Hard".into(),
            session_type: "Practice".into(),
            diameter: 60,
            width: 1024,
            height: 768,
            fullscreen: true,
            overwrite: false,
            tag: "Default".into(),
            font: None,
            instructions: None,
            poll_interval_ms: 0,
        }
    }
}

impl Settings {
    /// Loads settings, falling back to defaults on any problem; a broken
    /// settings file must not keep a session from running.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!("invalid settings file {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("unable to encode settings")?;
        fs::write(path, text).with_context(|| format!("unable to write {}", path.display()))
    }

    /// Trials per block rounded up to complete stimulus sets of four.
    pub fn rounded_trials(&self) -> u32 {
        self.block_trials.max(1).div_ceil(4) * 4
    }

    pub fn trial_feedback(&self) -> bool {
        self.session_type == "Practice"
    }
}

pub fn settings_path() -> PathBuf {
    match ProjectDirs::from("", "", "reflex") {
        Some(dirs) => dirs.config_dir().join("settings.json"),
        None => PathBuf::from("reflex_settings.json"),
    }
}

/// Data directory for the record file, created on demand.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match ProjectDirs::from("", "", "reflex") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => std::env::current_dir().context("no working directory")?,
    };
    fs::create_dir_all(&dir).with_context(|| format!("unable to create {}", dir.display()))?;
    Ok(dir)
}

/// Builds the four-color trial list: each color mapped to its response
/// key, with position offsets alternating across the set in the hard
/// condition and pinned to center in the easy one.
pub fn build_trial_list(settings: &Settings) -> Vec<TrialSpec> {
    const STIMULI: [(&str, char); 4] = [
        ("Red", 'u'),
        ("Green", 'i'),
        ("Blue", 'o'),
        ("Yellow", 'p'),
    ];
    const OFFSETS: [i32; 5] = [2, 1, 0, -1, -2];
    let hard = settings.condition == "Hard";
    (0..settings.rounded_trials() as usize)
        .map(|i| {
            let (stim, key) = STIMULI[i % STIMULI.len()];
            let offset = if hard { OFFSETS[i % OFFSETS.len()] } else { 0 };
            TrialSpec::new(stim, settings.condition.as_str(), key, offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trials_round_up_to_fours() {
        let mut settings = Settings::default();
        for (requested, expected) in [(29, 32), (30, 32), (32, 32), (1, 4)] {
            settings.block_trials = requested;
            assert_eq!(settings.rounded_trials(), expected);
        }
    }

    #[test]
    fn easy_condition_pins_offsets_to_center() {
        let settings = Settings {
            condition: "Easy".into(),
            block_trials: 8,
            ..Settings::default()
        };
        let list = build_trial_list(&settings);
        assert_eq!(list.len(), 8);
        assert!(list.iter().all(|spec| spec.offset == 0));
        assert!(list.iter().all(|spec| spec.condition == "Easy"));
    }

    #[test]
    fn hard_condition_cycles_offsets() {
        let settings = Settings {
            condition: "Hard".into(),
            block_trials: 8,
            ..Settings::default()
        };
        let list = build_trial_list(&settings);
        let offsets: Vec<i32> = list.iter().map(|spec| spec.offset).collect();
        assert_eq!(offsets, vec![2, 1, 0, -1, -2, 2, 1, 0]);
        assert_eq!(list[0].key, 'u');
        assert_eq!(list[3].key, 'p');
    }

    #[test]
    fn settings_survive_a_save_load_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            pid: "P042".into(),
            blocks: 2,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn broken_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
