//! `tracing-subscriber` initialization.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `log_level` is an `EnvFilter` directive
/// (e.g. `"info"`, `"debug,reqwest=warn"`); `RUST_LOG` overrides it if set.
pub fn init(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
