use hickory_proto::op::Message;
use palisade_dns_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

const MAX_UDP_RESPONSE: usize = 4096;

/// One-shot UDP exchange with `upstream`: encode, send, wait for the reply
/// within `timeout`, decode. Aborts early when `cancel` fires.
pub async fn exchange(
    msg: &Message,
    upstream: SocketAddr,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Message, DomainError> {
    let bytes = msg.to_vec().map_err(|e| DomainError::Proto(e.to_string()))?;

    let bind_addr: SocketAddr = if upstream.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| DomainError::Io(e.to_string()))?;
    socket
        .connect(upstream)
        .await
        .map_err(|e| DomainError::UpstreamFailed {
            server: upstream.to_string(),
            message: e.to_string(),
        })?;
    socket
        .send(&bytes)
        .await
        .map_err(|e| DomainError::UpstreamFailed {
            server: upstream.to_string(),
            message: e.to_string(),
        })?;

    let mut buf = vec![0u8; MAX_UDP_RESPONSE];
    let len = tokio::select! {
        _ = cancel.cancelled() => return Err(DomainError::Cancelled),
        received = tokio::time::timeout(timeout, socket.recv(&mut buf)) => {
            received
                .map_err(|_| DomainError::QueryTimeout)?
                .map_err(|e| DomainError::UpstreamFailed {
                    server: upstream.to_string(),
                    message: e.to_string(),
                })?
        }
    };

    Message::from_vec(&buf[..len]).map_err(|e| DomainError::Proto(e.to_string()))
}
