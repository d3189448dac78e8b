use super::store::Zone;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use palisade_dns_application::session::{Middleware, Session};
use palisade_dns_domain::{DomainError, Response};
use tracing::debug;

/// Serves queries for the zones it owns. A miss below an owned origin is an
/// authoritative NXDOMAIN; names no zone owns pass through.
pub struct ZoneProvider {
    zones: Vec<Zone>,
}

impl ZoneProvider {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl Middleware for ZoneProvider {
    fn name(&self) -> &str {
        "zone"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        let name = session.request().name();
        let class = session.request().query_class();
        let rtype = session.request().query_type();

        for zone in &self.zones {
            if !zone.owns(&name) {
                continue;
            }

            let served_by = format!("zone:{}", zone.origin());
            let records = zone.lookup(class, rtype, &name);

            if records.is_empty() {
                debug!(zone = %zone.origin(), name = %name, "authoritative miss");
                let mut msg = session.request().reply(ResponseCode::NXDomain);
                msg.set_authoritative(true);
                return session.resolve_with(
                    Response::new(msg)
                        .with_handler("zone")
                        .with_served_by(served_by),
                );
            }

            debug!(zone = %zone.origin(), name = %name, answers = records.len(), "authoritative answer");
            let mut msg = session.request().reply(ResponseCode::NoError);
            msg.set_authoritative(true);
            msg.insert_answers(records);
            return session.resolve_with(
                Response::new(msg)
                    .with_handler("zone")
                    .with_served_by(served_by),
            );
        }

        session.next()
    }
}
