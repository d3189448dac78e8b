mod tcp;
mod udp;

use hickory_proto::op::{Message, ResponseCode};
use palisade_dns_application::ports::ResponseWriter;
use palisade_dns_application::session::{Middleware, Session};
use palisade_dns_domain::{reply_to, DomainError, ListenEndpoint, ListenScheme, Request};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Binds the configured endpoints and serves queries until shutdown.
pub struct DnsServer {
    endpoints: Vec<ListenEndpoint>,
    stack: Arc<[Arc<dyn Middleware>]>,
    shutdown: CancellationToken,
}

impl DnsServer {
    pub fn new(
        endpoints: Vec<ListenEndpoint>,
        stack: Vec<Arc<dyn Middleware>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            endpoints,
            stack: stack.into(),
            shutdown,
        }
    }

    /// Runs every listener to completion. Returns the first listener error,
    /// if any; a cancelled shutdown returns `Ok`.
    pub async fn listen_and_serve(self) -> Result<(), DomainError> {
        if self.endpoints.is_empty() {
            return Err(DomainError::Io("no listeners configured".into()));
        }

        let mut listeners: JoinSet<Result<(), DomainError>> = JoinSet::new();

        for endpoint in &self.endpoints {
            let stack = Arc::clone(&self.stack);
            let token = self.shutdown.clone();
            let addr = endpoint.addr;

            match endpoint.scheme {
                ListenScheme::Udp => {
                    listeners.spawn(async move { udp::run_udp(addr, stack, token).await });
                }
                ListenScheme::Tcp => {
                    listeners.spawn(async move { tcp::run_tcp(addr, stack, token).await });
                }
            }
        }

        let mut first_err = None;
        while let Some(result) = listeners.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(error = %err, "listener failed");
                    if first_err.is_none() {
                        first_err = Some(err);
                        // take the remaining listeners down with it
                        self.shutdown.cancel();
                    }
                }
                Err(err) => {
                    error!(error = %err, "listener task panicked");
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Decodes one inbound message and drives it through the pipeline.
/// Question-less queries are answered with FORMERR here, outside the
/// pipeline; undecodable datagrams are dropped.
pub(crate) async fn dispatch(
    stack: &Arc<[Arc<dyn Middleware>]>,
    bytes: &[u8],
    mut writer: Box<dyn ResponseWriter>,
    shutdown: &CancellationToken,
) {
    let src = writer.remote_addr();

    let msg = match Message::from_vec(bytes) {
        Ok(msg) => msg,
        Err(err) => {
            debug!(client = %src, error = %err, "dropping undecodable query");
            return;
        }
    };

    if msg.queries().is_empty() {
        warn!(client = %src, "query without question");
        let reply = reply_to(&msg, ResponseCode::FormErr);
        if let Err(err) = writer.write_msg(&reply).await {
            debug!(client = %src, error = %err, "failed to write FORMERR");
        }
        return;
    }

    let request = match Request::new(msg, src) {
        Ok(request) => request,
        Err(_) => return,
    };

    let session = Session::new(
        Arc::clone(stack),
        request,
        writer,
        shutdown.child_token(),
    );

    if let Err(err) = session.run().await {
        debug!(client = %src, error = %err, "session finished with error");
    }
}
