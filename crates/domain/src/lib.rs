pub mod config;
pub mod errors;
pub mod request;
pub mod response;
pub mod verdict;

pub use config::{
    CacheConfig, CliOverrides, ConditionalForward, Config, ConfigError, ForwardConfig,
    ListenEndpoint, ListenScheme, LoggingConfig, PersistenceConfig, RulesConfig, SinkholeConfig,
    ZoneConfig,
};
pub use errors::DomainError;
pub use request::{reply_to, Request};
pub use response::{rcode_name, Response};
pub use verdict::Verdict;
