use crate::errors::DomainError;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};

/// An inbound DNS query together with its mutable per-request annotations.
///
/// The mark counter and the label set are adjusted by `Mark` verdicts while
/// the query moves through the middleware stack; everything else is fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct Request {
    msg: Message,
    src: SocketAddr,
    mark: i64,
    labels: BTreeSet<String>,
}

impl Request {
    /// Wraps a decoded message. Fails when the message carries no question.
    pub fn new(msg: Message, src: SocketAddr) -> Result<Self, DomainError> {
        if msg.queries().is_empty() {
            return Err(DomainError::MissingQuestion);
        }

        Ok(Self {
            msg,
            src,
            mark: 0,
            labels: BTreeSet::new(),
        })
    }

    fn question(&self) -> &Query {
        // guaranteed non-empty by `new`
        &self.msg.queries()[0]
    }

    /// Fully qualified, lowercased name of the first question.
    pub fn name(&self) -> Name {
        let mut name = self.question().name().to_lowercase();
        name.set_fqdn(true);
        name
    }

    pub fn query_class(&self) -> DNSClass {
        self.question().query_class()
    }

    pub fn query_type(&self) -> RecordType {
        self.question().query_type()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.src
    }

    pub fn client_ip(&self) -> IpAddr {
        self.src.ip()
    }

    pub fn client_port(&self) -> u16 {
        self.src.port()
    }

    pub fn message(&self) -> &Message {
        &self.msg
    }

    /// Copy of the query message, suitable for forwarding upstream.
    pub fn clone_message(&self) -> Message {
        self.msg.clone()
    }

    pub fn mark(&self) -> i64 {
        self.mark
    }

    pub fn add_mark(&mut self, amount: i64) {
        self.mark += amount;
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Adds labels to the request, deduplicating against the existing set.
    pub fn add_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
    }

    /// Builds a reply for this request carrying only an rcode.
    pub fn reply(&self, rcode: ResponseCode) -> Message {
        reply_to(&self.msg, rcode)
    }
}

/// Builds a response skeleton for `req`: same id and opcode, questions
/// echoed, recursion flags carried over.
pub fn reply_to(req: &Message, rcode: ResponseCode) -> Message {
    let mut msg = Message::new();
    msg.set_id(req.id())
        .set_op_code(req.op_code())
        .set_message_type(MessageType::Response)
        .set_recursion_desired(req.recursion_desired())
        .set_recursion_available(true)
        .set_response_code(rcode);

    for query in req.queries() {
        msg.add_query(query.clone());
    }

    msg
}
