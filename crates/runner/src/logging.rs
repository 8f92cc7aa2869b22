//! Logger setup

use env_logger::{Builder, Env};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Initialise env_logger from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Safe to call more than once.
pub fn init() {
    init_with(DEFAULT_FILTER);
}

pub fn init_with(default_filter: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}
