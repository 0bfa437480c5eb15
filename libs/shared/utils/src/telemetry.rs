use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shared_config::AppConfig;

/// Installs the global subscriber: `RUST_LOG` wins, otherwise the configured
/// filter. Returns false if a subscriber was already installed.
pub fn init_tracing(config: &AppConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
