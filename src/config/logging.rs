//! Tracing subscriber setup for hosts embedding the engine.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Call once, as early as possible. Panics if a global subscriber is already set.
pub fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Like [`init_tracing`], but leaves an existing subscriber in place. Output goes
/// through the test writer so `cargo test` captures it.
#[cfg(test)]
pub fn try_init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
