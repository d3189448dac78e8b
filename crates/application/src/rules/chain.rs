use hickory_proto::op::Message;
use palisade_dns_domain::{DomainError, Request, Verdict};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

use super::expr::Params;
use super::rule::Rule;

/// An ordered list of rules with a default verdict.
///
/// Rules evaluate in list order under the read lock; the first decisive
/// (non-`Noop`) verdict wins. A rule that fails to evaluate is logged and
/// skipped; evaluation errors are never fatal to the chain. If no rule
/// decides, the default verdict applies.
pub struct Chain {
    name: String,
    default: Verdict,
    rules: RwLock<Vec<Arc<Rule>>>,
}

impl Chain {
    pub fn new(name: impl Into<String>, default: Verdict, rules: Vec<Arc<Rule>>) -> Self {
        Self {
            name: name.into(),
            default: default.or_accept(),
            rules: RwLock::new(rules),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_verdict(&self) -> &Verdict {
        &self.default
    }

    /// Appends a rule; serialized against concurrent evaluation.
    pub fn add_rule(&self, rule: Arc<Rule>) {
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluates the chain for the given request/response environment.
    pub fn verdict(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<Verdict, DomainError> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);

        for (index, rule) in rules.iter().enumerate() {
            match rule.verdict(request, response, params) {
                Ok(Verdict::Noop) => continue,
                Ok(verdict) => return Ok(verdict),
                Err(err) => {
                    warn!(
                        chain = %self.name,
                        rule = index,
                        expression = rule.expression(),
                        error = %err,
                        "rule failed to evaluate"
                    );
                    continue;
                }
            }
        }

        Ok(self.default.clone())
    }
}
