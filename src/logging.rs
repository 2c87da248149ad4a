//! Structured logging setup.
//!
//! Logs go to stderr so they never mix with the typing screen on stdout.
//! The default filter stays quiet below warn; set `RUST_LOG` to see the
//! session engine's debug trail.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Call once at startup; repeated calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("typometer=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn default_filter_parses() {
        let filter = EnvFilter::new("typometer=warn");
        assert!(format!("{filter:?}").contains("typometer"));
    }
}
