use async_trait::async_trait;
use hickory_proto::op::Message;
use palisade_dns_domain::DomainError;
use std::net::SocketAddr;

/// Listener-side abstraction over the transport a response goes out on.
#[async_trait]
pub trait ResponseWriter: Send {
    fn local_addr(&self) -> SocketAddr;

    fn remote_addr(&self) -> SocketAddr;

    /// Writes the final DNS message to the client. The pipeline calls this
    /// exactly once per session.
    async fn write_msg(&mut self, msg: &Message) -> Result<(), DomainError>;

    /// Outcome of TSIG validation on the inbound request. `Ok` when the
    /// transport has no objection (no TSIG present, or the signature
    /// verified).
    fn tsig_status(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
