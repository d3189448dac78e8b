use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("request has no question")]
    MissingQuestion,

    #[error("session already ended")]
    SessionEnded,

    #[error("failed to serve request")]
    NotServed,

    #[error("middleware stack is empty")]
    EmptyStack,

    #[error("middleware {0} returned without ending or yielding the session")]
    HandlerStalled(String),

    #[error("session cancelled")]
    Cancelled,

    #[error("invalid rule expression: {0}")]
    RuleParse(String),

    #[error("rule evaluation failed: {0}")]
    RuleEval(String),

    #[error("invalid return value")]
    InvalidRuleResult,

    #[error("expression did not produce a verdict")]
    NotAVerdict,

    #[error("upstream {server} failed: {message}")]
    UpstreamFailed { server: String, message: String },

    #[error("query timeout")]
    QueryTimeout,

    #[error("dns protocol error: {0}")]
    Proto(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("i/o error: {0}")]
    Io(String),
}
