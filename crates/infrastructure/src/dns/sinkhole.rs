use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use palisade_dns_application::rules::Expr;
use palisade_dns_application::session::{Middleware, Session};
use palisade_dns_domain::{ConfigError, DomainError, Response};
use std::net::IpAddr;
use tracing::{debug, warn};

/// Answers matching queries with a fixed destination address.
///
/// The first predicate that holds synthesizes a one-answer response with
/// the question's class and type mirrored onto the record. Predicate
/// errors are logged and skipped; with no match the query passes through.
pub struct Sinkhole {
    destination: IpAddr,
    expressions: Vec<Expr>,
    name: String,
}

impl Sinkhole {
    pub fn new(destination: IpAddr, expressions: Vec<Expr>) -> Self {
        Self {
            destination,
            expressions,
            name: format!("sinkhole:{destination}"),
        }
    }

    /// Compiles the configured predicate expressions.
    pub fn from_rules(destination: IpAddr, rules: &[String]) -> Result<Self, ConfigError> {
        let mut expressions = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            expressions.push(Expr::new(rule).map_err(|e| ConfigError::InvalidRule {
                file: "sinkhole".to_string(),
                line: index + 1,
                message: e.to_string(),
            })?);
        }

        Ok(Self::new(destination, expressions))
    }

    fn answer(&self, name: Name, class: DNSClass, rtype: RecordType) -> Record {
        let mirrored = match (rtype, self.destination) {
            (RecordType::A, IpAddr::V4(addr)) => Some(RData::A(A(addr))),
            (RecordType::AAAA, IpAddr::V6(addr)) => Some(RData::AAAA(AAAA(addr))),
            _ => None,
        };

        // records are typed by their rdata; a question type that cannot
        // carry the destination falls back to the destination's own family
        let rdata = mirrored.unwrap_or_else(|| match self.destination {
            IpAddr::V4(addr) => RData::A(A(addr)),
            IpAddr::V6(addr) => RData::AAAA(AAAA(addr)),
        });

        let mut record = Record::from_rdata(name, 0, rdata);
        record.set_dns_class(class);
        record
    }
}

#[async_trait]
impl Middleware for Sinkhole {
    fn name(&self) -> &str {
        &self.name
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        for (index, expr) in self.expressions.iter().enumerate() {
            match expr.evaluate_bool(session.request(), None, None) {
                Ok(true) => {
                    let request = session.request();
                    debug!(name = %request.name(), destination = %self.destination, "sinkholing query");
                    let answer =
                        self.answer(request.name(), request.query_class(), request.query_type());
                    let mut msg = request.reply(ResponseCode::NoError);
                    msg.add_answer(answer);
                    return session.resolve_with(
                        Response::new(msg)
                            .with_handler(self.name.clone())
                            .with_served_by(self.destination.to_string()),
                    );
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(rule = index, error = %err, "sinkhole expression failed to evaluate");
                }
            }
        }

        session.next()
    }
}
