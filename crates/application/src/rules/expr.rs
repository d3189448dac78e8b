use evalexpr::{
    build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value,
};
use hickory_proto::op::Message;
use palisade_dns_domain::{rcode_name, DomainError, Request, Verdict};
use std::collections::HashMap;

use super::functions::{decode_verdict, register_intrinsics};

/// Extra bindings merged into the evaluation environment.
pub type Params = HashMap<String, Value>;

/// A compiled rule expression, reusable across evaluations.
///
/// The expression text is parsed once; each evaluation assembles a fresh
/// read-only environment from the intrinsic functions, the registered
/// constants, the optional per-call parameters, and the derived
/// request/response bindings, with later sources overriding earlier ones.
#[derive(Debug)]
pub struct Expr {
    text: String,
    node: Node,
    consts: Params,
}

impl Expr {
    pub fn new(text: &str) -> Result<Self, DomainError> {
        Self::with_consts(text, Params::new())
    }

    pub fn with_consts(text: &str, consts: Params) -> Result<Self, DomainError> {
        let node =
            build_operator_tree(text).map_err(|e| DomainError::RuleParse(e.to_string()))?;

        Ok(Self {
            text: text.to_string(),
            node,
            consts,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn environment(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<HashMapContext, DomainError> {
        let mut ctx = HashMapContext::new();

        register_intrinsics(&mut ctx).map_err(|e| DomainError::RuleEval(e.to_string()))?;

        let mut bind = |key: String, value: Value| {
            ctx.set_value(key, value)
                .map_err(|e| DomainError::RuleEval(e.to_string()))
        };

        for (key, value) in &self.consts {
            bind(key.clone(), value.clone())?;
        }

        if let Some(params) = params {
            for (key, value) in params {
                bind(key.clone(), value.clone())?;
            }
        }

        bind(
            "request.Name".into(),
            Value::String(request.name().to_string()),
        )?;
        bind(
            "request.Type".into(),
            Value::String(request.query_type().to_string()),
        )?;
        bind(
            "request.Class".into(),
            Value::String(request.query_class().to_string()),
        )?;
        bind(
            "clientIP".into(),
            Value::String(request.client_ip().to_string()),
        )?;

        if let Some(response) = response {
            bind(
                "response.Rcode".into(),
                Value::String(rcode_name(response.response_code()).to_string()),
            )?;
            bind(
                "response.Answers".into(),
                Value::Int(response.answers().len() as i64),
            )?;
            bind(
                "response.Extras".into(),
                Value::Int(response.additionals().len() as i64),
            )?;
        }

        Ok(ctx)
    }

    /// Evaluates against the given request (and, for OUTPUT-style rules,
    /// the response).
    pub fn evaluate(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<Value, DomainError> {
        let ctx = self.environment(request, response, params)?;
        self.node
            .eval_with_context(&ctx)
            .map_err(|e| DomainError::RuleEval(e.to_string()))
    }

    /// Coerces the result to a boolean. Any other result type, including a
    /// verdict, is an error at this call site.
    pub fn evaluate_bool(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<bool, DomainError> {
        match self.evaluate(request, response, params)? {
            Value::Boolean(value) => Ok(value),
            _ => Err(DomainError::InvalidRuleResult),
        }
    }

    /// Requires the expression to produce a verdict.
    pub fn verdict(
        &self,
        request: &Request,
        response: Option<&Message>,
        params: Option<&Params>,
    ) -> Result<Verdict, DomainError> {
        let value = self.evaluate(request, response, params)?;
        decode_verdict(&value).ok_or(DomainError::NotAVerdict)
    }
}
