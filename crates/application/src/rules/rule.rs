use hickory_proto::op::Message;
use palisade_dns_domain::{DomainError, Request, Verdict};
use std::sync::atomic::{AtomicU64, Ordering};

use super::expr::{Expr, Params};

/// A single firewall rule: its expression text, the compiled form, and the
/// number of times it has produced a decisive verdict.
#[derive(Debug)]
pub struct Rule {
    expression: String,
    compiled: Expr,
    matches: AtomicU64,
}

impl Rule {
    pub fn new(expression: &str) -> Result<Self, DomainError> {
        Self::with_consts(expression, Params::new())
    }

    pub fn with_consts(expression: &str, consts: Params) -> Result<Self, DomainError> {
        Ok(Self {
            expression: expression.to_string(),
            compiled: Expr::with_consts(expression, consts)?,
            matches: AtomicU64::new(0),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// How many times this rule decided (returned anything but `Noop`).
    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    /// Evaluates the rule, counting every decisive verdict.
    pub fn verdict(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<Verdict, DomainError> {
        let verdict = self.compiled.verdict(request, response, params)?;

        if !verdict.is_noop() {
            self.matches.fetch_add(1, Ordering::Relaxed);
        }

        Ok(verdict)
    }
}
