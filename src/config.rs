use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs;

/// Words generated for a timed test; the block is large enough to outlast
/// any realistic countdown at the supported limits.
pub const TIME_MODE_WORD_COUNT: usize = 100;

/// Fallback word quota when a words-mode config carries no explicit limit.
pub const DEFAULT_WORD_LIMIT: usize = 50;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Countdown with a fixed number of seconds.
    Time,
    /// Fixed word quota, no countdown.
    Words,
}

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("time mode requires a time limit")]
    MissingTimeLimit,
    #[error("words mode requires a word limit")]
    MissingWordLimit,
    #[error("time limit must be at least one second")]
    ZeroTimeLimit,
    #[error("word limit must be at least one word")]
    ZeroWordLimit,
}

/// Parameters for a single test. The limit matching the mode must be set;
/// the other limit is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub time_limit_secs: Option<u64>,
    pub word_limit: Option<usize>,
    pub punctuation: bool,
    pub numbers: bool,
}

impl TestConfig {
    pub fn timed(secs: u64, difficulty: Difficulty) -> Self {
        Self {
            mode: Mode::Time,
            difficulty,
            time_limit_secs: Some(secs),
            word_limit: None,
            punctuation: false,
            numbers: false,
        }
    }

    pub fn words(count: usize, difficulty: Difficulty) -> Self {
        Self {
            mode: Mode::Words,
            difficulty,
            time_limit_secs: None,
            word_limit: Some(count),
            punctuation: false,
            numbers: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            Mode::Time => {
                let secs = self.time_limit_secs.ok_or(ConfigError::MissingTimeLimit)?;
                if secs == 0 {
                    return Err(ConfigError::ZeroTimeLimit);
                }
            }
            Mode::Words => {
                let words = self.word_limit.ok_or(ConfigError::MissingWordLimit)?;
                if words == 0 {
                    return Err(ConfigError::ZeroWordLimit);
                }
            }
        }
        Ok(())
    }

    /// How many words of text to generate for this test.
    pub fn text_word_count(&self) -> usize {
        match self.mode {
            Mode::Words => self.word_limit.unwrap_or(DEFAULT_WORD_LIMIT),
            Mode::Time => TIME_MODE_WORD_COUNT,
        }
    }
}

/// Preferences that survive between runs. Both limits are remembered so
/// switching modes restores the last value used in each.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    pub number_of_secs: u64,
    pub number_of_words: usize,
    pub difficulty: Difficulty,
    pub punctuation: bool,
    pub numbers: bool,
    pub goal_wpm: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Time,
            number_of_secs: 60,
            number_of_words: 50,
            difficulty: Difficulty::Medium,
            punctuation: false,
            numbers: false,
            goal_wpm: 60,
        }
    }
}

impl Settings {
    pub fn to_test_config(&self) -> TestConfig {
        TestConfig {
            mode: self.mode,
            difficulty: self.difficulty,
            time_limit_secs: (self.mode == Mode::Time).then_some(self.number_of_secs),
            word_limit: (self.mode == Mode::Words).then_some(self.number_of_words),
            punctuation: self.punctuation,
            numbers: self.numbers,
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = app_dirs::settings_path()
            .unwrap_or_else(|| PathBuf::from("typometer_settings.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<Settings>(&bytes) {
                return settings;
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
