use super::dispatch;
use async_trait::async_trait;
use hickory_proto::op::Message;
use palisade_dns_application::ports::ResponseWriter;
use palisade_dns_application::session::Middleware;
use palisade_dns_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const MAX_TCP_MESSAGE: usize = 65535;

fn io_err(err: std::io::Error) -> DomainError {
    DomainError::Io(err.to_string())
}

fn bind_tcp(addr: SocketAddr) -> Result<TcpListener, DomainError> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(io_err)?;
    socket.set_reuse_address(true).map_err(io_err)?;
    socket.bind(&addr.into()).map_err(io_err)?;
    socket.listen(1024).map_err(io_err)?;
    socket.set_nonblocking(true).map_err(io_err)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(io_err)
}

pub(super) async fn run_tcp(
    addr: SocketAddr,
    stack: Arc<[Arc<dyn Middleware>]>,
    shutdown: CancellationToken,
) -> Result<(), DomainError> {
    let listener = bind_tcp(addr)?;
    let local = listener.local_addr().map_err(io_err)?;
    info!(listen = %local, "tcp listener ready");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!(listen = %local, "tcp listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let stack = Arc::clone(&stack);
                        let token = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(stream, peer, local, stack, token).await {
                                debug!(client = %peer, error = %err, "tcp connection closed");
                            }
                        });
                    }
                    Err(err) => {
                        error!(listen = %local, error = %err, "tcp accept failed");
                    }
                }
            }
        }
    }
}

/// Serves length-prefixed queries from one connection, sequentially.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    local: SocketAddr,
    stack: Arc<[Arc<dyn Middleware>]>,
    shutdown: CancellationToken,
) -> Result<(), DomainError> {
    let (mut read_half, write_half) = stream.into_split();
    let write_half = Arc::new(Mutex::new(write_half));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            frame = read_frame(&mut read_half) => {
                let bytes = match frame {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => return Ok(()),
                    Err(err) => return Err(err),
                };

                let writer = Box::new(TcpResponseWriter {
                    stream: Arc::clone(&write_half),
                    peer,
                    local,
                });
                dispatch(&stack, &bytes, writer, &shutdown).await;
            }
        }
    }
}

async fn read_frame(stream: &mut OwnedReadHalf) -> Result<Option<Vec<u8>>, DomainError> {
    let mut len_buf = [0u8; 2];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(io_err(err)),
    }

    let len = u16::from_be_bytes(len_buf) as usize;
    let mut frame = vec![0u8; len];
    stream.read_exact(&mut frame).await.map_err(io_err)?;

    Ok(Some(frame))
}

struct TcpResponseWriter {
    stream: Arc<Mutex<OwnedWriteHalf>>,
    peer: SocketAddr,
    local: SocketAddr,
}

#[async_trait]
impl ResponseWriter for TcpResponseWriter {
    fn local_addr(&self) -> SocketAddr {
        self.local
    }

    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn write_msg(&mut self, msg: &Message) -> Result<(), DomainError> {
        let bytes = msg.to_vec().map_err(|e| DomainError::Proto(e.to_string()))?;
        if bytes.len() > MAX_TCP_MESSAGE {
            return Err(DomainError::Proto(format!(
                "response too large for tcp: {} bytes",
                bytes.len()
            )));
        }

        let mut stream = self.stream.lock().await;
        stream
            .write_all(&(bytes.len() as u16).to_be_bytes())
            .await
            .map_err(io_err)?;
        stream.write_all(&bytes).await.map_err(io_err)?;
        stream.flush().await.map_err(io_err)?;

        Ok(())
    }
}
