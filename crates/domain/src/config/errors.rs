use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    FileRead(String, String),

    #[error("failed to parse {0}: {1}")]
    Parse(String, String),

    #[error("invalid listen endpoint '{0}': {1}")]
    InvalidListener(String, String),

    #[error("invalid upstream address '{0}': {1}")]
    InvalidUpstream(String, String),

    #[error("invalid conditional forwarder '{0}': {1}")]
    InvalidConditional(String, String),

    #[error("{file}:{line}: invalid rule: {message}")]
    InvalidRule {
        file: String,
        line: usize,
        message: String,
    },

    #[error("invalid zone {file}: {message}")]
    InvalidZone { file: String, message: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}
