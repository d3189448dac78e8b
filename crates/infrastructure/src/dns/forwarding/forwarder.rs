use super::exchange::exchange;
use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{Record, RecordType};
use palisade_dns_application::rules::Expr;
use palisade_dns_application::session::{Middleware, Session};
use palisade_dns_domain::{ConditionalForward, ConfigError, DomainError, Response};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Forwards queries upstream.
///
/// Conditional upstreams are consulted first, in insertion order; the first
/// one whose predicate holds gets the query, and a network failure after
/// selection rejects the session. With no conditional match, the default
/// upstreams are tried in order until one answers; if all fail the session
/// falls through to the next middleware.
pub struct Forwarder {
    upstreams: Vec<SocketAddr>,
    conditional: Vec<(SocketAddr, Expr)>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(upstreams: Vec<SocketAddr>, conditional: Vec<(SocketAddr, Expr)>) -> Self {
        Self {
            upstreams,
            conditional,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a forwarder from configuration, compiling the conditional
    /// predicate expressions.
    pub fn from_config(
        upstreams: Vec<SocketAddr>,
        conditional: &[ConditionalForward],
    ) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(conditional.len());
        for forward in conditional {
            let expr = Expr::new(&forward.expression).map_err(|e| {
                ConfigError::InvalidConditional(forward.to_string(), e.to_string())
            })?;
            compiled.push((forward.upstream, expr));
        }

        Ok(Self::new(upstreams, compiled))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Middleware for Forwarder {
    fn name(&self) -> &str {
        "forwarder"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        let mut query = session.request().clone_message();
        strip_tsig(&mut query);

        let cancel = session.cancellation().clone();

        for (upstream, expr) in &self.conditional {
            match expr.evaluate_bool(session.request(), None, None) {
                Ok(true) => {
                    debug!(upstream = %upstream, name = %session.request().name(), "conditional upstream selected");
                    return match exchange(&query, *upstream, self.timeout, &cancel).await {
                        Ok(reply) => session.resolve_with(
                            Response::new(reply)
                                .with_handler("forwarder")
                                .with_served_by(upstream.to_string()),
                        ),
                        Err(err) => session.reject_error(ResponseCode::NXDomain, err),
                    };
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(upstream = %upstream, error = %err, "conditional expression failed to evaluate");
                }
            }
        }

        for upstream in &self.upstreams {
            match exchange(&query, *upstream, self.timeout, &cancel).await {
                Ok(reply) => {
                    debug!(upstream = %upstream, name = %session.request().name(), "resolved upstream");
                    return session.resolve_with(
                        Response::new(reply)
                            .with_handler("forwarder")
                            .with_served_by(upstream.to_string()),
                    );
                }
                Err(err) => {
                    warn!(upstream = %upstream, name = %session.request().name(), error = %err, "upstream failed");
                }
            }
        }

        debug!(name = %session.request().name(), "no upstream available");
        session.next()
    }
}

/// The inbound transaction signature must not leak to upstreams.
fn strip_tsig(msg: &mut Message) {
    if msg
        .additionals()
        .iter()
        .any(|record| record.record_type() == RecordType::TSIG)
    {
        let keep: Vec<Record> = msg
            .additionals()
            .iter()
            .filter(|record| record.record_type() != RecordType::TSIG)
            .cloned()
            .collect();
        msg.insert_additionals(keep);
    }
}
