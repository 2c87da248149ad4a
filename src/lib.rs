// Library surface for the binary, headless runs and integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod results;
pub mod runtime;
pub mod session;
pub mod store;
pub mod words;

use std::time::Duration;

/// Countdown granularity: the session clock advances one second per tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
