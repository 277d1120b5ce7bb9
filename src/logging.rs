//! Logging initialization.
//!
//! The session logs dispatched commands at `info`, stdout traffic at
//! `debug`, and stderr traffic at `warn`; set `RUST_LOG=ssh_relay=debug`
//! to see full command output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "ssh_relay=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system.
///
/// # Panics
///
/// Panics if another tracing subscriber has already been set. Library
/// consumers embedding their own subscriber should skip this entirely;
/// binaries and test harnesses can use [`try_init`] instead.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system, failing quietly if a subscriber
/// is already installed.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
