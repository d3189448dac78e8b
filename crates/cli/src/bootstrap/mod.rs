use palisade_dns_domain::{CliOverrides, Config, ConfigError};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Loads the configuration file (if any) and applies the CLI overrides.
pub fn load_config(path: Option<&Path>, overrides: CliOverrides) -> Result<Config, ConfigError> {
    Config::load(path, overrides)
}

/// Initializes the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
