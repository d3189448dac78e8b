use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use super::forward::ConditionalForward;
use super::listener::ListenEndpoint;

/// Main configuration. Loaded from an optional TOML file, then overridden
/// by command-line flags; flags win over the file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub listen: Vec<ListenEndpoint>,
    pub rules: RulesConfig,
    pub zone: Option<ZoneConfig>,
    pub forward: ForwardConfig,
    pub sinkhole: Option<SinkholeConfig>,
    pub cache: CacheConfig,
    pub persistence: Option<PersistenceConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub file: PathBuf,
    pub origin: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ForwardConfig {
    pub upstreams: Vec<SocketAddr>,
    pub conditional: Vec<ConditionalForward>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkholeConfig {
    pub destination: IpAddr,
    pub rules: Vec<String>,
}

impl Default for SinkholeConfig {
    fn default() -> Self {
        Self {
            destination: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub eviction_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            eviction_interval_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Command-line overrides applied on top of the loaded file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub listen: Vec<ListenEndpoint>,
    pub listen_all: bool,
    pub input_rules: Option<PathBuf>,
    pub output_rules: Option<PathBuf>,
    pub zone_file: Option<PathBuf>,
    pub zone_origin: Option<String>,
    pub forwarders: Vec<SocketAddr>,
    pub forward_if: Vec<ConditionalForward>,
    pub sinkhole: Option<IpAddr>,
    pub sinkhole_if: Vec<String>,
    pub persist: Option<PathBuf>,
    pub log_level: Option<String>,
}

const DEFAULT_CONFIG_PATHS: &[&str] = &["palisade-dns.toml", "/etc/palisade-dns/config.toml"];

impl Config {
    /// Loads the configuration. Priority: explicit path, then the well-known
    /// locations, then defaults; CLI overrides are applied last.
    pub fn load(path: Option<&Path>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(found) = DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Self::from_file(found)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(overrides)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) -> Result<(), ConfigError> {
        if !overrides.listen.is_empty() {
            self.listen = overrides.listen;
        }

        if overrides.listen_all {
            self.listen = vec![
                ListenEndpoint::udp(([0, 0, 0, 0], 53).into()),
                ListenEndpoint::tcp(([0, 0, 0, 0], 53).into()),
            ];
        }

        if let Some(path) = overrides.input_rules {
            self.rules.input = Some(path);
        }
        if let Some(path) = overrides.output_rules {
            self.rules.output = Some(path);
        }

        match (overrides.zone_file, overrides.zone_origin) {
            (Some(file), Some(origin)) => self.zone = Some(ZoneConfig { file, origin }),
            (None, None) => {}
            _ => {
                return Err(ConfigError::Validation(
                    "--zone and --origin must be given together".into(),
                ))
            }
        }

        if !overrides.forwarders.is_empty() {
            self.forward.upstreams = overrides.forwarders;
        }
        if !overrides.forward_if.is_empty() {
            self.forward.conditional = overrides.forward_if;
        }

        if let Some(destination) = overrides.sinkhole {
            self.sinkhole = Some(SinkholeConfig {
                destination,
                rules: overrides.sinkhole_if,
            });
        }

        if let Some(file) = overrides.persist {
            self.persistence = Some(PersistenceConfig { file });
        }

        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }

        Ok(())
    }

    fn normalize(&mut self) {
        if self.listen.is_empty() {
            self.listen = vec![ListenEndpoint::udp(([127, 0, 0, 1], 5353).into())];
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(sinkhole) = &self.sinkhole {
            if sinkhole.rules.is_empty() {
                return Err(ConfigError::Validation(
                    "sinkhole requires at least one predicate expression".into(),
                ));
            }
        }

        if let Some(zone) = &self.zone {
            if zone.origin.trim().is_empty() {
                return Err(ConfigError::Validation("zone origin is empty".into()));
            }
        }

        Ok(())
    }
}
