//! Logging setup

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more than
/// once is harmless; only the first call installs a subscriber.
pub fn init(default_filter: &str) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(default_filter))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.try_init();
}
