mod errors;
mod forward;
mod listener;
mod root;

pub use errors::ConfigError;
pub use forward::ConditionalForward;
pub use listener::{ListenEndpoint, ListenScheme};
pub use root::{
    CacheConfig, CliOverrides, Config, ForwardConfig, LoggingConfig, PersistenceConfig,
    RulesConfig, SinkholeConfig, ZoneConfig,
};
