#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use palisade_dns_application::ports::ResponseWriter;
use palisade_dns_application::session::{Middleware, Session};
use palisade_dns_domain::{reply_to, DomainError, Request};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub const CLIENT: &str = "192.0.2.1:53000";

pub fn query_message(name: &str, rtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(0x4d2)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);

    let mut query = Query::query(Name::from_utf8(name).unwrap(), rtype);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg
}

pub fn make_request(name: &str, rtype: RecordType) -> Request {
    Request::new(query_message(name, rtype), CLIENT.parse().unwrap()).unwrap()
}

pub fn a_record(name: &str, ttl: u32, addr: [u8; 4]) -> Record {
    Record::from_rdata(
        Name::from_utf8(name).unwrap(),
        ttl,
        RData::A(hickory_proto::rr::rdata::A(addr.into())),
    )
}

#[derive(Default)]
pub struct WriteSink {
    messages: Mutex<Vec<Message>>,
}

impl WriteSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

pub struct CaptureWriter {
    sink: Arc<WriteSink>,
}

impl CaptureWriter {
    pub fn new(sink: Arc<WriteSink>) -> Box<Self> {
        Box::new(Self { sink })
    }
}

#[async_trait]
impl ResponseWriter for CaptureWriter {
    fn local_addr(&self) -> SocketAddr {
        "127.0.0.1:5353".parse().unwrap()
    }

    fn remote_addr(&self) -> SocketAddr {
        CLIENT.parse().unwrap()
    }

    async fn write_msg(&mut self, msg: &Message) -> Result<(), DomainError> {
        self.sink.messages.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

pub async fn run_session(
    handlers: Vec<Arc<dyn Middleware>>,
    request: Request,
    sink: Arc<WriteSink>,
) -> Result<(), DomainError> {
    let session = Session::new(
        handlers.into(),
        request,
        CaptureWriter::new(sink),
        CancellationToken::new(),
    );
    session.run().await
}

/// Resolves every query with a fixed answer set.
pub struct Resolver {
    pub rcode: ResponseCode,
    pub answers: Vec<Record>,
}

impl Resolver {
    pub fn noerror(answers: Vec<Record>) -> Arc<Self> {
        Arc::new(Self {
            rcode: ResponseCode::NoError,
            answers,
        })
    }
}

#[async_trait]
impl Middleware for Resolver {
    fn name(&self) -> &str {
        "resolver"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.resolve(self.rcode, self.answers.clone(), Vec::new())
    }
}

/// A scripted upstream DNS server answering every query with one A record
/// for the question name, counting the queries it receives.
pub struct MockUpstream {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(ip: Ipv4Addr, ttl: u32) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let served = Arc::clone(&hits);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    received = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = received else { continue };
                        served.fetch_add(1, Ordering::SeqCst);

                        let Ok(query) = Message::from_vec(&buf[..len]) else { continue };
                        let mut reply = reply_to(&query, ResponseCode::NoError);
                        if let Some(question) = query.queries().first() {
                            reply.add_answer(Record::from_rdata(
                                question.name().clone(),
                                ttl,
                                RData::A(A(ip)),
                            ));
                        }

                        if let Ok(bytes) = reply.to_vec() {
                            let _ = socket.send_to(&bytes, peer).await;
                        }
                    }
                }
            }
        });

        Self {
            addr,
            hits,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
