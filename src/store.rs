use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::app_dirs;
use crate::metrics::TypingStats;
use crate::results::{ResultSink, SinkError, TestResult};

/// Local archive of finished tests, one row per result. The config travels
/// as JSON in a single column; the metrics get their own columns so the
/// table stays greppable with the sqlite shell.
#[derive(Debug)]
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Open the database at the default location, creating it on first use.
    pub fn open_default() -> Result<Self, SinkError> {
        let db_path =
            app_dirs::results_db_path().unwrap_or_else(|| PathBuf::from("typometer_results.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SinkError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                config TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                correct_chars INTEGER NOT NULL,
                incorrect_chars INTEGER NOT NULL,
                total_chars INTEGER NOT NULL,
                time_spent_secs REAL NOT NULL,
                text TEXT NOT NULL,
                completed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_completed_at ON results(completed_at)",
            [],
        )?;

        Ok(ResultStore { conn })
    }

    pub fn insert(&self, result: &TestResult) -> Result<(), SinkError> {
        self.conn.execute(
            r#"
            INSERT INTO results
            (config, wpm, accuracy, correct_chars, incorrect_chars, total_chars, time_spent_secs, text, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                serde_json::to_string(&result.config)?,
                result.stats.wpm,
                result.stats.accuracy,
                result.stats.correct_chars,
                result.stats.incorrect_chars,
                result.stats.total_chars,
                result.time_spent_secs,
                result.text,
                result.completed_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Most recent results, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<TestResult>, SinkError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT config, wpm, accuracy, correct_chars, incorrect_chars, total_chars, time_spent_secs, text, completed_at
            FROM results
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            let config_json: String = row.get(0)?;
            let config = serde_json::from_str(&config_json).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    "config".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;

            let completed_str: String = row.get(8)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        8,
                        "completed_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(TestResult {
                config,
                stats: TypingStats {
                    wpm: row.get(1)?,
                    accuracy: row.get(2)?,
                    correct_chars: row.get(3)?,
                    incorrect_chars: row.get(4)?,
                    total_chars: row.get(5)?,
                },
                time_spent_secs: row.get(6)?,
                text: row.get(7)?,
                completed_at,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}

impl ResultSink for ResultStore {
    fn save(&mut self, result: &TestResult) -> Result<(), SinkError> {
        self.insert(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, TestConfig};
    use crate::metrics;

    fn create_test_store() -> ResultStore {
        ResultStore::open_in_memory().unwrap()
    }

    fn result_completed_at(completed_at: DateTime<Local>) -> TestResult {
        TestResult {
            config: TestConfig::words(25, Difficulty::Easy),
            stats: metrics::compute("the cat sat", "the cat sat", 6.0),
            time_spent_secs: 6.0,
            text: "the cat sat".into(),
            completed_at,
        }
    }

    #[test]
    fn insert_and_read_back() {
        let store = create_test_store();
        let result = result_completed_at(Local::now());

        store.insert(&result).unwrap();

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], result);
    }

    #[test]
    fn recent_returns_newest_first() {
        let store = create_test_store();
        let now = Local::now();
        let oldest = result_completed_at(now - chrono::Duration::hours(2));
        let middle = result_completed_at(now - chrono::Duration::hours(1));
        let newest = result_completed_at(now);

        // Insert out of order on purpose.
        store.insert(&middle).unwrap();
        store.insert(&newest).unwrap();
        store.insert(&oldest).unwrap();

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].completed_at, newest.completed_at);
        assert_eq!(recent[1].completed_at, middle.completed_at);
    }

    #[test]
    fn recent_handles_short_tables() {
        let store = create_test_store();
        assert!(store.recent(5).unwrap().is_empty());

        store.insert(&result_completed_at(Local::now())).unwrap();
        assert_eq!(store.recent(5).unwrap().len(), 1);
    }

    #[test]
    fn config_survives_the_json_column() {
        let store = create_test_store();
        let mut result = result_completed_at(Local::now());
        result.config.punctuation = true;
        result.config.numbers = true;

        store.insert(&result).unwrap();

        let loaded = &store.recent(1).unwrap()[0];
        assert_eq!(loaded.config, result.config);
    }

    #[test]
    fn store_works_as_a_sink() {
        let mut store = create_test_store();
        let result = result_completed_at(Local::now());
        {
            let sink: &mut dyn ResultSink = &mut store;
            sink.save(&result).unwrap();
        }
        assert_eq!(store.recent(1).unwrap().len(), 1);
    }
}
