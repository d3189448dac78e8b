use async_trait::async_trait;
use hickory_proto::rr::{DNSClass, RecordType};
use palisade_dns_application::ports::{
    Conversation, ConversationCursor, ConversationReader, ConversationWriter,
};
use palisade_dns_domain::DomainError;
use std::sync::{Mutex, PoisonError};

fn canonical(name: &str) -> String {
    let mut key = name.to_ascii_lowercase();
    if !key.ends_with('.') {
        key.push('.');
    }
    key
}

/// In-memory conversation store; the reference implementation of the reader
/// interface and the backend used by tests.
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: Mutex<Vec<Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filtered<F>(&self, predicate: F) -> ConversationCursor
    where
        F: Fn(&Conversation) -> bool,
    {
        let matched: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|conversation| predicate(conversation))
            .cloned()
            .collect();

        Box::new(matched.into_iter())
    }
}

#[async_trait]
impl ConversationWriter for MemoryConversationStore {
    async fn write(&self, conversation: Conversation) -> Result<(), DomainError> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conversation);
        Ok(())
    }
}

impl ConversationReader for MemoryConversationStore {
    fn by_client(&self, ip: &str) -> ConversationCursor {
        let ip = ip.to_string();
        self.filtered(move |conversation| conversation.request.client_ip().to_string() == ip)
    }

    fn by_domain(&self, name: &str) -> ConversationCursor {
        let name = canonical(name);
        self.filtered(move |conversation| conversation.request.name().to_string() == name)
    }

    fn by_request(&self, name: &str, class: DNSClass, rtype: RecordType) -> ConversationCursor {
        let name = canonical(name);
        self.filtered(move |conversation| {
            conversation.request.name().to_string() == name
                && conversation.request.query_class() == class
                && conversation.request.query_type() == rtype
        })
    }

    fn by_response(&self, class: DNSClass, rtype: RecordType, rdata: &str) -> ConversationCursor {
        let rdata = rdata.to_string();
        self.filtered(move |conversation| {
            conversation
                .response
                .message()
                .answers()
                .iter()
                .any(|record| {
                    record.dns_class() == class
                        && record.record_type() == rtype
                        && record
                            .data()
                            .map(|data| data.to_string() == rdata)
                            .unwrap_or(false)
                })
        })
    }
}
