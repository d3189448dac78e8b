#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use palisade_dns_application::ports::ResponseWriter;
use palisade_dns_application::session::{CompleteHook, Middleware, Session};
use palisade_dns_domain::{DomainError, Request, Response};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const CLIENT: &str = "192.0.2.1:53000";

pub fn query_message(name: &str, rtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(0x2b2b)
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

/// Collects every message a session writes, for inspection after the
/// session has been consumed.
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

pub fn run_session(
    handlers: Vec<Arc<dyn Middleware>>,
    request: Request,
    sink: Arc<WriteSink>,
) -> impl std::future::Future<Output = Result<(), DomainError>> {
    let session = Session::new(
        handlers.into(),
        request,
        CaptureWriter::new(sink),
        CancellationToken::new(),
    );
    session.run()
}

/// Resolves every query with a fixed rcode and answer set.
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

/// Yields to the next handler, counting how often it was consulted.
#[derive(Default)]
pub struct Yielder {
    pub served: AtomicUsize,
}

impl Yielder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Middleware for Yielder {
    fn name(&self) -> &str {
        "yielder"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        self.served.fetch_add(1, Ordering::SeqCst);
        session.next()
    }
}

/// Returns without resolving or yielding: a broken middleware.
pub struct Staller;

#[async_trait]
impl Middleware for Staller {
    fn name(&self) -> &str {
        "staller"
    }

    async fn serve(&self, _session: &mut Session) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Fails with an error without touching the session.
pub struct Failer;

#[async_trait]
impl Middleware for Failer {
    fn name(&self) -> &str {
        "failer"
    }

    async fn serve(&self, _session: &mut Session) -> Result<(), DomainError> {
        Err(DomainError::Io("broken handler".into()))
    }
}

/// Registers a tagged on-complete hook, then yields.
pub struct HookTagger {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl HookTagger {
    pub fn new(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
        Arc::new(Self { tag, log })
    }
}

#[async_trait]
impl Middleware for HookTagger {
    fn name(&self) -> &str {
        self.tag
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.register_complete(Arc::new(TagHook {
            tag: self.tag,
            log: Arc::clone(&self.log),
        }));
        session.next()
    }
}

struct TagHook {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl CompleteHook for TagHook {
    async fn on_complete(&self, _request: &mut Request, _response: &mut Response) {
        self.log.lock().unwrap().push(self.tag);
    }
}

/// Registers a hook that overwrites the response rcode during the mangle
/// phase, then yields.
pub struct RcodeMangler {
    pub rcode: ResponseCode,
}

impl RcodeMangler {
    pub fn new(rcode: ResponseCode) -> Arc<Self> {
        Arc::new(Self { rcode })
    }
}

#[async_trait]
impl Middleware for RcodeMangler {
    fn name(&self) -> &str {
        "mangler"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.register_complete(Arc::new(RcodeHook { rcode: self.rcode }));
        session.next()
    }
}

struct RcodeHook {
    rcode: ResponseCode,
}

#[async_trait]
impl CompleteHook for RcodeHook {
    async fn on_complete(&self, _request: &mut Request, response: &mut Response) {
        response.message_mut().set_response_code(self.rcode);
    }
}

/// Resolves while recording the request annotations it observed, so tests
/// can assert on mark/label mutation done by earlier middleware.
pub struct AnnotationProbe {
    pub seen: Mutex<Option<(i64, Vec<String>)>>,
}

impl AnnotationProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(None),
        })
    }

    pub fn observed(&self) -> Option<(i64, Vec<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Middleware for AnnotationProbe {
    fn name(&self) -> &str {
        "probe"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        let request = session.request();
        let labels = request.labels().map(str::to_string).collect();
        *self.seen.lock().unwrap() = Some((request.mark(), labels));
        session.resolve(ResponseCode::NoError, Vec::new(), Vec::new())
    }
}
