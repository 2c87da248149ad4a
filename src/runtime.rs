use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::TICK_INTERVAL;

/// Event consumed by the session loop. Keystrokes and the countdown
/// heartbeat arrive through the same channel, so session state is only
/// ever touched from one place.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Key(KeyEvent),
    Tick,
}

/// Source of keyboard events.
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source reading from the terminal.
pub struct TerminalEventSource {
    rx: Receiver<SessionEvent>,
}

impl TerminalEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(SessionEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for TerminalEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TerminalEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Event source fed from a plain channel, for tests and headless runs.
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable tick cadence.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker; the default runs at the countdown granularity.
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Pulls the next event for the loop, interleaving ticks on a fixed
/// deadline schedule. The deadline advances independently of input, so a
/// steady stream of keystrokes cannot starve the countdown.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            next_tick: Instant::now() + ticker.interval(),
            event_source,
            ticker,
        }
    }

    /// Blocks until the next event, or `Tick` once the deadline passes.
    pub fn step(&mut self) -> SessionEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            self.next_tick += self.ticker.interval();
            return SessionEvent::Tick;
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                self.next_tick += self.ticker.interval();
                SessionEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => {
                // Source gone; keep the heartbeat so a timed test can
                // still run out.
                let now = Instant::now();
                if self.next_tick > now {
                    std::thread::sleep(self.next_tick - now);
                }
                self.next_tick += self.ticker.interval();
                SessionEvent::Tick
            }
        }
    }
}
