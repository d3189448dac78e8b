use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hickory_proto::rr::{DNSClass, RecordType};
use palisade_dns_domain::{DomainError, Request, Response};

/// One served query: the request with its final annotations and the
/// response that went out on the wire.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub time: DateTime<Utc>,
    pub request: Request,
    pub response: Response,
}

/// Cursor over stored conversations, yielded one at a time.
pub type ConversationCursor = Box<dyn Iterator<Item = Conversation> + Send>;

/// Sink for served conversations. The pipeline does not interpret the
/// backend's layout.
#[async_trait]
pub trait ConversationWriter: Send + Sync {
    async fn write(&self, conversation: Conversation) -> Result<(), DomainError>;
}

/// Query side of a conversation store.
pub trait ConversationReader: Send + Sync {
    fn by_client(&self, ip: &str) -> ConversationCursor;

    fn by_domain(&self, name: &str) -> ConversationCursor;

    fn by_request(&self, name: &str, class: DNSClass, rtype: RecordType) -> ConversationCursor;

    fn by_response(&self, class: DNSClass, rtype: RecordType, rdata: &str) -> ConversationCursor;
}
