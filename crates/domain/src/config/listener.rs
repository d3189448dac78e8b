use super::errors::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenScheme {
    Udp,
    Tcp,
}

impl fmt::Display for ListenScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenScheme::Udp => write!(f, "udp"),
            ListenScheme::Tcp => write!(f, "tcp"),
        }
    }
}

/// A listener address in `scheme://host:port` form. An empty host binds the
/// wildcard address, so `udp://:53` is the usual "all interfaces" spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ListenEndpoint {
    pub scheme: ListenScheme,
    pub addr: SocketAddr,
}

impl ListenEndpoint {
    pub fn udp(addr: SocketAddr) -> Self {
        Self {
            scheme: ListenScheme::Udp,
            addr,
        }
    }

    pub fn tcp(addr: SocketAddr) -> Self {
        Self {
            scheme: ListenScheme::Tcp,
            addr,
        }
    }
}

fn parse_host_port(s: &str) -> Result<SocketAddr, String> {
    if let Some(rest) = s.strip_prefix('[') {
        // bracketed IPv6, e.g. [::1]:53
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| "unterminated '[' in host".to_string())?;
        let port_str = rest
            .strip_prefix(':')
            .ok_or_else(|| "missing port".to_string())?;
        let host: IpAddr = host.parse().map_err(|e| format!("invalid host: {e}"))?;
        let port: u16 = port_str.parse().map_err(|e| format!("invalid port: {e}"))?;
        return Ok(SocketAddr::new(host, port));
    }

    let (host, port_str) = s.rsplit_once(':').ok_or_else(|| "missing port".to_string())?;
    let port: u16 = port_str.parse().map_err(|e| format!("invalid port: {e}"))?;

    let host: IpAddr = if host.is_empty() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        host.parse().map_err(|e| format!("invalid host: {e}"))?
    };

    Ok(SocketAddr::new(host, port))
}

impl FromStr for ListenEndpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ConfigError::InvalidListener(s.to_string(), "missing scheme".into()))?;

        let scheme = match scheme {
            "udp" => ListenScheme::Udp,
            "tcp" => ListenScheme::Tcp,
            other => {
                return Err(ConfigError::InvalidListener(
                    s.to_string(),
                    format!("unsupported scheme '{other}'"),
                ))
            }
        };

        let addr = parse_host_port(rest)
            .map_err(|message| ConfigError::InvalidListener(s.to_string(), message))?;

        Ok(Self { scheme, addr })
    }
}

impl TryFrom<String> for ListenEndpoint {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.addr)
    }
}
