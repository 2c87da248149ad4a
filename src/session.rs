use std::time::SystemTime;

use chrono::Local;
use tracing::{debug, warn};

use crate::config::{ConfigError, Mode, TestConfig};
use crate::generator::TextGenerator;
use crate::metrics::{self, CharClass, TypingStats};
use crate::results::{ResultSink, TestResult};
use crate::TICK_INTERVAL;

/// Lifecycle of one test. `Completed` is terminal; starting over means
/// building a fresh session, not rewinding this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Completed,
}

/// One typing test from creation to completion.
///
/// All mutation goes through [`Session::update_input`], [`Session::tick`]
/// and [`Session::toggle_pause`]. Callers funnel keystrokes and the
/// one-second heartbeat through a single loop, so none of these can
/// interleave and the completion handler can fire at most once.
pub struct Session {
    config: TestConfig,
    reference: String,
    typed: String,
    phase: Phase,
    started_at: Option<SystemTime>,
    seconds_remaining: Option<f64>,
    result: Option<TestResult>,
    sink: Option<Box<dyn ResultSink>>,
}

impl Session {
    /// Build a session with generated text. The config is validated first;
    /// nothing ticks or accepts input until that passes.
    pub fn new(config: TestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let reference = TextGenerator::new(&config).generate(config.text_word_count());
        Self::with_reference(config, reference)
    }

    /// Build a session around a fixed text.
    pub fn with_reference(config: TestConfig, reference: String) -> Result<Self, ConfigError> {
        config.validate()?;
        // The countdown is armed from creation so a test nobody types into
        // still expires.
        let seconds_remaining = config.time_limit_secs.map(|secs| secs as f64);
        Ok(Self {
            config,
            reference,
            typed: String::new(),
            phase: Phase::Idle,
            started_at: None,
            seconds_remaining,
            result: None,
            sink: None,
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the input with its new full contents. The first non-empty
    /// change starts the clock; input while paused or after completion is
    /// dropped. In words mode the event whose token count reaches the
    /// quota completes the test.
    pub fn update_input(&mut self, typed: &str) {
        match self.phase {
            Phase::Paused | Phase::Completed => return,
            Phase::Idle => {
                if typed.is_empty() {
                    return;
                }
                self.started_at = Some(SystemTime::now());
                self.phase = Phase::Running;
                debug!("first keystroke, clock started");
            }
            Phase::Running => {}
        }

        self.typed = typed.to_string();

        if self.config.mode == Mode::Words {
            if let Some(limit) = self.config.word_limit {
                if metrics::words_typed(&self.typed) >= limit {
                    self.complete();
                }
            }
        }
    }

    /// Advance the countdown by one interval. Ticks land while idle or
    /// running; paused and completed sessions ignore them, as do sessions
    /// without a time limit.
    pub fn tick(&mut self) {
        if self.phase == Phase::Paused || self.phase == Phase::Completed {
            return;
        }
        let Some(remaining) = self.seconds_remaining else {
            return;
        };

        let remaining = (remaining - TICK_INTERVAL.as_secs_f64()).max(0.0);
        self.seconds_remaining = Some(remaining);
        if remaining <= 0.0 {
            self.complete();
        }
    }

    /// Flip between running and paused. Idle and completed sessions are
    /// left alone.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                debug!("paused");
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                debug!("resumed");
            }
            Phase::Idle | Phase::Completed => {}
        }
    }

    fn complete(&mut self) {
        // At most one completion per session, whatever got us here.
        if self.phase == Phase::Completed {
            return;
        }
        self.phase = Phase::Completed;

        // Timed tests report the configured limit; word tests report wall
        // clock time, pauses included.
        let elapsed = match self.config.mode {
            Mode::Time => self.config.time_limit_secs.unwrap_or(0) as f64,
            Mode::Words => self.wall_elapsed_secs(),
        };

        let stats = metrics::compute(&self.reference, &self.typed, elapsed);
        debug!(
            wpm = stats.wpm,
            accuracy = stats.accuracy,
            elapsed_secs = elapsed,
            "test completed"
        );

        let result = TestResult {
            config: self.config.clone(),
            stats,
            time_spent_secs: elapsed,
            text: self.reference.clone(),
            completed_at: Local::now(),
        };

        if let Some(sink) = self.sink.as_mut() {
            // Fire and forget: a sink failure is logged and the session
            // stays completed.
            if let Err(err) = sink.save(&result) {
                warn!(error = %err, "failed to save result");
            }
        }

        self.result = Some(result);
    }

    fn wall_elapsed_secs(&self) -> f64 {
        self.started_at
            .and_then(|at| at.elapsed().ok())
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Stats for the input so far, recomputed on every call. After
    /// completion prefer [`Session::result`], which froze the final
    /// numbers.
    pub fn live_stats(&self) -> TypingStats {
        metrics::compute(&self.reference, &self.typed, self.wall_elapsed_secs())
    }

    /// Render class per character of the text.
    pub fn char_classes(&self) -> Vec<CharClass> {
        metrics::classes(&self.reference, &self.typed)
    }

    pub fn words_typed(&self) -> usize {
        metrics::words_typed(&self.typed)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn seconds_remaining(&self) -> Option<f64> {
        self.seconds_remaining
    }

    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }
}
