use super::errors::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// A conditional upstream in `host:port=expression` form. Everything after
/// the first `=` belongs to the expression, which may itself contain `=`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ConditionalForward {
    pub upstream: SocketAddr,
    pub expression: String,
}

impl FromStr for ConditionalForward {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (upstream, expression) = s.split_once('=').ok_or_else(|| {
            ConfigError::InvalidConditional(s.to_string(), "expected host:port=expression".into())
        })?;

        let upstream: SocketAddr = upstream
            .parse()
            .map_err(|e| ConfigError::InvalidConditional(s.to_string(), format!("{e}")))?;

        if expression.trim().is_empty() {
            return Err(ConfigError::InvalidConditional(
                s.to_string(),
                "empty expression".into(),
            ));
        }

        Ok(Self {
            upstream,
            expression: expression.to_string(),
        })
    }
}

impl TryFrom<String> for ConditionalForward {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ConditionalForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.upstream, self.expression)
    }
}
