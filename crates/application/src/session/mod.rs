mod tsig;

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;
use palisade_dns_domain::{DomainError, Request, Response};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::ports::ResponseWriter;

/// A middleware serves a session by resolving it, rejecting it, or yielding
/// to the next handler in the stack. Returning without doing one of those
/// is a programming error the pipeline detects and reports.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError>;
}

/// Hook invoked once after the session has ended and before the response is
/// written. Hooks run sequentially in registration order and may rewrite the
/// response (and the request annotations) in place.
#[async_trait]
pub trait CompleteHook: Send + Sync {
    async fn on_complete(&self, request: &mut Request, response: &mut Response);
}

/// Per-request state machine driving a query through the middleware stack.
///
/// Exactly one of the following holds when `run` returns without a
/// programmer error: a response was written, or the writer failed. The
/// `ended` flag only ever transitions false → true.
pub struct Session {
    handlers: Arc<[Arc<dyn Middleware>]>,
    request: Request,
    writer: Box<dyn ResponseWriter>,
    cancel: CancellationToken,
    response: Option<Response>,
    pending_error: Option<DomainError>,
    on_complete: Vec<Arc<dyn CompleteHook>>,
    ended: bool,
    advance: bool,
}

impl Session {
    pub fn new(
        handlers: Arc<[Arc<dyn Middleware>]>,
        request: Request,
        writer: Box<dyn ResponseWriter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            handlers,
            request,
            writer,
            cancel,
            response: None,
            pending_error: None,
            on_complete: Vec::new(),
            ended: false,
            advance: false,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Ambient cancellation token, propagated from the listener. Middleware
    /// doing network I/O must respect it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Registers a hook for the mangle phase.
    pub fn register_complete(&mut self, hook: Arc<dyn CompleteHook>) {
        self.on_complete.push(hook);
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.ended {
            Err(DomainError::SessionEnded)
        } else {
            Ok(())
        }
    }

    /// Yields to the next handler in the stack.
    pub fn next(&mut self) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.advance = true;
        Ok(())
    }

    /// Attaches `response` and ends the session.
    pub fn resolve_with(&mut self, response: Response) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.ended = true;
        self.response = Some(response);
        Ok(())
    }

    /// Resolves the session with an rcode plus answer and extra sections.
    pub fn resolve(
        &mut self,
        rcode: ResponseCode,
        answers: Vec<Record>,
        extras: Vec<Record>,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        let mut msg = self.request.reply(rcode);
        msg.insert_answers(answers);
        msg.insert_additionals(extras);
        self.resolve_with(Response::new(msg))
    }

    /// Rejects the request with an rcode-only response.
    pub fn reject(&mut self, rcode: ResponseCode) -> Result<(), DomainError> {
        self.ensure_open()?;
        let msg = self.request.reply(rcode);
        self.resolve_with(Response::new(msg))
    }

    /// As `reject`, but `err` becomes the pipeline's return value. The rcode
    /// response is still what goes out on the wire.
    pub fn reject_error(&mut self, rcode: ResponseCode, err: DomainError) -> Result<(), DomainError> {
        self.reject(rcode)?;
        self.pending_error = Some(err);
        Ok(())
    }

    fn end_with(&mut self, rcode: ResponseCode) {
        self.ended = true;
        self.response = Some(Response::new(self.request.reply(rcode)));
    }

    /// Runs the session: walks the handler stack, fans out the on-complete
    /// hooks, applies TSIG passthrough, and writes the final response.
    ///
    /// The returned error is for the listener's logs; except for the
    /// programmer-error cases (`EmptyStack`, `HandlerStalled`) a well-formed
    /// DNS message has been written regardless.
    pub async fn run(mut self) -> Result<(), DomainError> {
        if self.handlers.is_empty() {
            return Err(DomainError::EmptyStack);
        }

        let handlers = Arc::clone(&self.handlers);
        let mut idx = 0;

        while !self.ended {
            let Some(handler) = handlers.get(idx) else {
                // walked past the last handler without a resolution
                self.end_with(ResponseCode::ServFail);
                self.pending_error.get_or_insert(DomainError::NotServed);
                break;
            };

            self.advance = false;

            if let Err(err) = handler.serve(&mut self).await {
                error!(middleware = handler.name(), error = %err, "middleware failed");
                if !self.ended {
                    self.end_with(ResponseCode::ServFail);
                }
                self.pending_error.get_or_insert(err);
                break;
            }

            if !self.ended && !self.advance {
                return Err(DomainError::HandlerStalled(handler.name().to_string()));
            }

            idx += 1;
        }

        let mut response = match self.response.take() {
            Some(response) => response,
            None => Response::new(self.request.reply(ResponseCode::ServFail)),
        };

        let hooks = std::mem::take(&mut self.on_complete);
        for hook in hooks {
            hook.on_complete(&mut self.request, &mut response).await;
        }

        if self.writer.tsig_status().is_ok() {
            tsig::attach_passthrough(self.request.message(), response.message_mut());
        }

        self.writer.write_msg(response.message()).await?;

        match self.pending_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
