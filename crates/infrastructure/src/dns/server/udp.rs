use super::dispatch;
use async_trait::async_trait;
use hickory_proto::op::Message;
use palisade_dns_application::ports::ResponseWriter;
use palisade_dns_application::session::Middleware;
use palisade_dns_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const MAX_UDP_QUERY: usize = 4096;

fn io_err(err: std::io::Error) -> DomainError {
    DomainError::Io(err.to_string())
}

fn bind_udp(addr: SocketAddr) -> Result<UdpSocket, DomainError> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(io_err)?;
    socket.set_reuse_address(true).map_err(io_err)?;
    socket.bind(&addr.into()).map_err(io_err)?;
    socket.set_nonblocking(true).map_err(io_err)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(io_err)
}

pub(super) async fn run_udp(
    addr: SocketAddr,
    stack: Arc<[Arc<dyn Middleware>]>,
    shutdown: CancellationToken,
) -> Result<(), DomainError> {
    let socket = Arc::new(bind_udp(addr)?);
    let local = socket.local_addr().map_err(io_err)?;
    info!(listen = %local, "udp listener ready");

    let mut buf = vec![0u8; MAX_UDP_QUERY];

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(listen = %local, "udp listener shutting down");
                return Ok(());
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, peer)) => {
                        let bytes = buf[..len].to_vec();
                        let stack = Arc::clone(&stack);
                        let socket = Arc::clone(&socket);
                        let token = shutdown.clone();

                        tokio::spawn(async move {
                            let writer = Box::new(UdpResponseWriter {
                                socket,
                                peer,
                                local,
                            });
                            dispatch(&stack, &bytes, writer, &token).await;
                        });
                    }
                    Err(err) => {
                        error!(listen = %local, error = %err, "udp receive failed");
                    }
                }
            }
        }
    }
}

struct UdpResponseWriter {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    local: SocketAddr,
}

#[async_trait]
impl ResponseWriter for UdpResponseWriter {
    fn local_addr(&self) -> SocketAddr {
        self.local
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn write_msg(&mut self, msg: &Message) -> Result<(), DomainError> {
        let bytes = msg.to_vec().map_err(|e| DomainError::Proto(e.to_string()))?;
        self.socket
            .send_to(&bytes, self.peer)
            .await
            .map_err(|e| DomainError::Io(e.to_string()))?;
        Ok(())
    }
}
