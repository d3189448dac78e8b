use super::storage::ResponseCache;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use palisade_dns_application::session::{CompleteHook, Middleware, Session};
use palisade_dns_domain::{DomainError, Request, Response};
use std::sync::Arc;
use tracing::debug;

const CACHE_HANDLER: &str = "cache";

/// Caching middleware: answers from the shared cache when it can, otherwise
/// registers a write-through hook and yields.
pub struct CacheMiddleware {
    cache: Arc<ResponseCache>,
    hook: Arc<CacheWriteHook>,
}

impl CacheMiddleware {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self {
            hook: Arc::new(CacheWriteHook {
                cache: Arc::clone(&cache),
            }),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }
}

#[async_trait]
impl Middleware for CacheMiddleware {
    fn name(&self) -> &str {
        CACHE_HANDLER
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        let request = session.request();
        let answers = self.cache.lookup(
            &request.name().to_string(),
            request.query_class(),
            request.query_type(),
        );

        if !answers.is_empty() {
            debug!(name = %request.name(), answers = answers.len(), "cache hit");
            let mut msg = request.reply(ResponseCode::NoError);
            msg.insert_answers(answers);
            return session.resolve_with(
                Response::new(msg)
                    .with_handler(CACHE_HANDLER)
                    .with_served_by(CACHE_HANDLER),
            );
        }

        session.register_complete(Arc::clone(&self.hook) as Arc<dyn CompleteHook>);
        session.next()
    }
}

struct CacheWriteHook {
    cache: Arc<ResponseCache>,
}

#[async_trait]
impl CompleteHook for CacheWriteHook {
    async fn on_complete(&self, _request: &mut Request, response: &mut Response) {
        // responses produced by the cache itself must not re-enter it
        if response.handler() == Some(CACHE_HANDLER) {
            return;
        }

        let msg = response.message();
        self.cache
            .admit(msg.answers().iter().chain(msg.additionals().iter()));
    }
}
