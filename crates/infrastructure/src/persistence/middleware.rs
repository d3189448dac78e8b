use async_trait::async_trait;
use chrono::Utc;
use palisade_dns_application::ports::{Conversation, ConversationWriter};
use palisade_dns_application::session::{CompleteHook, Middleware, Session};
use palisade_dns_domain::{DomainError, Request, Response};
use std::sync::Arc;
use tracing::warn;

/// Records every conversation in a store during the mangle phase. Store
/// failures are logged and never affect the response.
pub struct Persister {
    hook: Arc<PersistHook>,
}

impl Persister {
    pub fn new(store: Arc<dyn ConversationWriter>) -> Self {
        Self {
            hook: Arc::new(PersistHook { store }),
        }
    }
}

#[async_trait]
impl Middleware for Persister {
    fn name(&self) -> &str {
        "persistence"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.register_complete(Arc::clone(&self.hook) as Arc<dyn CompleteHook>);
        session.next()
    }
}

struct PersistHook {
    store: Arc<dyn ConversationWriter>,
}

#[async_trait]
impl CompleteHook for PersistHook {
    async fn on_complete(&self, request: &mut Request, response: &mut Response) {
        let conversation = Conversation {
            time: Utc::now(),
            request: request.clone(),
            response: response.clone(),
        };

        if let Err(err) = self.store.write(conversation).await {
            warn!(error = %err, "failed to store conversation");
        }
    }
}
