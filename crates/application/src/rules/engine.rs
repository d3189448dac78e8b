use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use palisade_dns_domain::{DomainError, Request, Response, Verdict};
use std::sync::Arc;
use tracing::{debug, warn};

use super::chain::Chain;
use super::rule::Rule;
use crate::session::{CompleteHook, Middleware, Session};

/// The INPUT/OUTPUT rule engine middleware.
///
/// The INPUT chain decides the fate of inbound queries during `serve`; the
/// OUTPUT chain runs in the mangle phase and may rewrite the response. The
/// OUTPUT hook is registered before INPUT evaluation, so rejections are
/// mangled too.
pub struct RuleEngine {
    input: Chain,
    output: Arc<OutputHook>,
}

impl RuleEngine {
    pub fn new(
        input_default: Verdict,
        output_default: Verdict,
        input_rules: Vec<Arc<Rule>>,
        output_rules: Vec<Arc<Rule>>,
    ) -> Self {
        Self {
            input: Chain::new("INPUT", input_default, input_rules),
            output: Arc::new(OutputHook {
                chain: Chain::new("OUTPUT", output_default, output_rules),
            }),
        }
    }

    pub fn add_input_rule(&self, rule: Arc<Rule>) {
        self.input.add_rule(rule);
    }

    pub fn add_output_rule(&self, rule: Arc<Rule>) {
        self.output.chain.add_rule(rule);
    }

    pub fn input(&self) -> &Chain {
        &self.input
    }

    pub fn output(&self) -> &Chain {
        &self.output.chain
    }
}

#[async_trait]
impl Middleware for RuleEngine {
    fn name(&self) -> &str {
        "rules"
    }

    async fn serve(&self, session: &mut Session) -> Result<(), DomainError> {
        session.register_complete(Arc::clone(&self.output) as Arc<dyn CompleteHook>);

        match self.input.verdict(session.request(), None, None) {
            Ok(Verdict::Accept) | Ok(Verdict::Noop) => session.next(),
            Ok(Verdict::Reject { code }) => {
                debug!(name = %session.request().name(), rcode = ?code, "INPUT chain rejected query");
                session.reject(code)
            }
            Ok(Verdict::Mark { amount, labels }) => {
                let request = session.request_mut();
                request.add_mark(amount);
                request.add_labels(labels);
                session.next()
            }
            Ok(Verdict::Sinkhole { destination }) => {
                // the dedicated sinkhole middleware is the supported mechanism
                debug!(destination = %destination, "sinkhole verdict on INPUT chain");
                session.reject(ResponseCode::NotImp)
            }
            Err(err) => session.reject_error(ResponseCode::Refused, err),
        }
    }
}

struct OutputHook {
    chain: Chain,
}

#[async_trait]
impl CompleteHook for OutputHook {
    async fn on_complete(&self, request: &mut Request, response: &mut Response) {
        match self.chain.verdict(request, Some(response.message()), None) {
            Ok(Verdict::Accept) | Ok(Verdict::Noop) => {}
            Ok(Verdict::Mark { amount, labels }) => {
                request.add_mark(amount);
                request.add_labels(labels);
            }
            Ok(Verdict::Reject { code }) => {
                let msg = response.message_mut();
                msg.insert_answers(Vec::new());
                msg.insert_additionals(Vec::new());
                msg.set_response_code(code);
            }
            Ok(Verdict::Sinkhole { .. }) => {
                response
                    .message_mut()
                    .set_response_code(ResponseCode::NotImp);
            }
            Err(err) => {
                warn!(error = %err, "OUTPUT chain evaluation failed");
                let msg = response.message_mut();
                msg.insert_answers(Vec::new());
                msg.insert_additionals(Vec::new());
                msg.set_response_code(ResponseCode::Refused);
            }
        }
    }
}
