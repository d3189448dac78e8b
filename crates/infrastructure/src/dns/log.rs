use async_trait::async_trait;
use palisade_dns_application::session::{CompleteHook, Middleware, Session};
use palisade_dns_domain::{rcode_name, DomainError, Request, Response};
use std::sync::Arc;
use tracing::info;

/// Emits one structured log line per conversation during the mangle phase.
pub struct QueryLogger {
    hook: Arc<LogHook>,
}

impl QueryLogger {
    pub fn new() -> Self {
        Self {
            hook: Arc::new(LogHook),
        }
    }
}

impl Default for QueryLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for QueryLogger {
    fn name(&self) -> &str {
        "log"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.register_complete(Arc::clone(&self.hook) as Arc<dyn CompleteHook>);
        session.next()
    }
}

struct LogHook;

#[async_trait]
impl CompleteHook for LogHook {
    async fn on_complete(&self, request: &mut Request, response: &mut Response) {
        let answer = response
            .message()
            .answers()
            .first()
            .map(|record| record.to_string())
            .unwrap_or_else(|| "unresolved".to_string());

        info!(
            client = %request.remote_addr(),
            name = %request.name(),
            class = %request.query_class(),
            qtype = %request.query_type(),
            rcode = rcode_name(response.message().response_code()),
            served_by = response.served_by().unwrap_or("-"),
            answer = %answer,
            "query served"
        );
    }
}
