use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::app_dirs;
use crate::config::TestConfig;
use crate::metrics::TypingStats;

/// One completed test. The session engine produces exactly one of these,
/// at the moment the test completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub config: TestConfig,
    #[serde(flatten)]
    pub stats: TypingStats,
    pub time_spent_secs: f64,
    pub text: String,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("database failure: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("serialization failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for completed results. `save` is called at most once per
/// session and is never retried; a failed save must not disturb the
/// session that produced the result.
pub trait ResultSink {
    fn save(&mut self, result: &TestResult) -> Result<(), SinkError>;
}

/// Append-only CSV log of finished tests, one row per result.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    date: String,
    mode: String,
    difficulty: String,
    wpm: u32,
    accuracy: u32,
    correct_chars: usize,
    incorrect_chars: usize,
    total_chars: usize,
    time_spent_secs: f64,
    text: &'a str,
}

impl<'a> HistoryRow<'a> {
    fn from_result(result: &'a TestResult) -> Self {
        Self {
            date: result.completed_at.format("%c").to_string(),
            mode: result.config.mode.to_string(),
            difficulty: result.config.difficulty.to_string(),
            wpm: result.stats.wpm,
            accuracy: result.stats.accuracy,
            correct_chars: result.stats.correct_chars,
            incorrect_chars: result.stats.incorrect_chars,
            total_chars: result.stats.total_chars,
            time_spent_secs: result.time_spent_secs,
            text: &result.text,
        }
    }
}

impl HistoryLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = app_dirs::history_log_path()
            .unwrap_or_else(|| PathBuf::from("typometer_history.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for HistoryLog {
    fn save(&mut self, result: &TestResult) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // The header goes in only when the file is first created.
        let needs_header = !self.path.exists();

        let log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(log_file);
        writer.serialize(HistoryRow::from_result(result))?;
        writer.flush()?;

        Ok(())
    }
}

/// Sink that keeps results in memory; clones share the same buffer. Used
/// by tests and headless runs to observe what the engine emitted.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    results: Arc<Mutex<Vec<TestResult>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<TestResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn save(&mut self, result: &TestResult) -> Result<(), SinkError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Fans one result out to several sinks. Every sink gets a save attempt
/// even when an earlier one fails; the first error is reported.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn ResultSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResultSink for MultiSink {
    fn save(&mut self, result: &TestResult) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.save(result) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::metrics;
    use tempfile::tempdir;

    fn sample_result() -> TestResult {
        TestResult {
            config: TestConfig::timed(60, Difficulty::Medium),
            stats: metrics::compute("the cat sat", "the cat sag", 6.0),
            time_spent_secs: 60.0,
            text: "the cat sat".into(),
            completed_at: Local::now(),
        }
    }

    #[test]
    fn result_json_is_flat_over_stats() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["wpm"], 30);
        assert_eq!(json["accuracy"], 91);
        assert_eq!(json["config"]["mode"], "time");
        assert!(json.get("stats").is_none());
    }

    #[test]
    fn history_log_appends_with_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut log = HistoryLog::with_path(&path);

        log.save(&sample_result()).unwrap();
        log.save(&sample_result()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,mode,difficulty,wpm,accuracy"));
        assert!(lines[1].contains("time,medium,30,91"));
    }

    #[test]
    fn history_log_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("history.csv");
        let mut log = HistoryLog::with_path(&path);
        log.save(&sample_result()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn memory_sink_shares_buffer_across_clones() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.save(&sample_result()).unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.results()[0].stats.wpm, 30);
    }

    #[test]
    fn multi_sink_feeds_all_destinations() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let mut multi = MultiSink::new();
        multi.push(Box::new(first.clone()));
        multi.push(Box::new(second.clone()));

        multi.save(&sample_result()).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}
