use evalexpr::{
    ContextWithMutableFunctions, EvalexprError, EvalexprResult, Function, HashMapContext, Value,
};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Name;
use ipnetwork::IpNetwork;
use palisade_dns_domain::Verdict;
use std::net::IpAddr;

/// Tuple head marking a value as an encoded verdict. Verdicts travel through
/// the evaluator as tagged tuples and are decoded back at the call site.
const VERDICT_TAG: &str = "palisade.verdict";

fn tag() -> Value {
    Value::String(VERDICT_TAG.to_string())
}

pub(super) fn encode_verdict(verdict: &Verdict) -> Value {
    let parts = match verdict {
        Verdict::Accept => vec![tag(), Value::String("accept".into())],
        Verdict::Noop => vec![tag(), Value::String("noop".into())],
        Verdict::Reject { code } => vec![
            tag(),
            Value::String("reject".into()),
            Value::Int(i64::from(code.low())),
        ],
        Verdict::Mark { amount, labels } => vec![
            tag(),
            Value::String("mark".into()),
            Value::Int(*amount),
            Value::Tuple(labels.iter().cloned().map(Value::String).collect()),
        ],
        Verdict::Sinkhole { destination } => vec![
            tag(),
            Value::String("sinkhole".into()),
            Value::String(destination.clone()),
        ],
    };

    Value::Tuple(parts)
}

pub(super) fn decode_verdict(value: &Value) -> Option<Verdict> {
    let Value::Tuple(parts) = value else {
        return None;
    };

    match parts.as_slice() {
        [Value::String(head), Value::String(kind)] if head == VERDICT_TAG => match kind.as_str() {
            "accept" => Some(Verdict::Accept),
            "noop" => Some(Verdict::Noop),
            _ => None,
        },
        [Value::String(head), Value::String(kind), Value::Int(code)]
            if head == VERDICT_TAG && kind == "reject" =>
        {
            Some(Verdict::Reject {
                code: ResponseCode::from_low(*code as u8),
            })
        }
        [Value::String(head), Value::String(kind), Value::Int(amount), Value::Tuple(labels)]
            if head == VERDICT_TAG && kind == "mark" =>
        {
            let labels = labels
                .iter()
                .filter_map(|label| match label {
                    Value::String(label) => Some(label.clone()),
                    _ => None,
                })
                .collect();
            Some(Verdict::Mark {
                amount: *amount,
                labels,
            })
        }
        [Value::String(head), Value::String(kind), Value::String(destination)]
            if head == VERDICT_TAG && kind == "sinkhole" =>
        {
            Some(Verdict::Sinkhole {
                destination: destination.clone(),
            })
        }
        _ => None,
    }
}

fn args_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Tuple(values) => values.clone(),
        Value::Empty => Vec::new(),
        other => vec![other.clone()],
    }
}

fn wrong_type(function: &str, index: usize) -> EvalexprError {
    EvalexprError::CustomMessage(format!(
        "{function}(): wrong type for parameter {}",
        index + 1
    ))
}

fn wrong_arity(function: &str) -> EvalexprError {
    EvalexprError::CustomMessage(format!("{function}(): invalid number of arguments"))
}

fn bool_arg(args: &[Value], index: usize, function: &str) -> EvalexprResult<bool> {
    match args.get(index) {
        Some(Value::Boolean(value)) => Ok(*value),
        _ => Err(wrong_type(function, index)),
    }
}

fn int_arg(args: &[Value], index: usize, function: &str) -> EvalexprResult<i64> {
    match args.get(index) {
        Some(Value::Int(value)) => Ok(*value),
        _ => Err(wrong_type(function, index)),
    }
}

fn str_arg(args: &[Value], index: usize, function: &str) -> EvalexprResult<String> {
    match args.get(index) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(wrong_type(function, index)),
    }
}

/// True iff `child` equals or lies strictly under `parent`. Comparison is
/// label-wise and case-insensitive; a missing trailing dot is tolerated.
pub fn is_subdomain(parent: &str, child: &str) -> EvalexprResult<bool> {
    let parent = Name::from_utf8(parent).map_err(|e| {
        EvalexprError::CustomMessage(format!("isSubdomain(): invalid name '{parent}': {e}"))
    })?;
    let child = Name::from_utf8(child).map_err(|e| {
        EvalexprError::CustomMessage(format!("isSubdomain(): invalid name '{child}': {e}"))
    })?;

    Ok(parent.zone_of(&child))
}

/// True iff `target` lies inside `network`, which is either CIDR notation
/// (v4 or v6) or an nmap-style v4 octet range such as `192.168.1-3.5-10`
/// (inclusive on both ends).
pub fn in_network(target: &str, network: &str) -> EvalexprResult<bool> {
    let ip: IpAddr = target
        .parse()
        .map_err(|_| EvalexprError::CustomMessage("inNetwork(): invalid target IP".into()))?;

    if let Ok(net) = network.parse::<IpNetwork>() {
        return Ok(net.contains(ip));
    }

    // fall back to the octet-range form; only meaningful for IPv4
    let ip_parts: Vec<&str> = target.split('.').collect();
    if ip_parts.len() != 4 {
        return Err(EvalexprError::CustomMessage(
            "inNetwork(): target must be IPv4 for octet-range checks".into(),
        ));
    }

    let net_parts: Vec<&str> = network.split('.').collect();
    if net_parts.len() != 4 {
        return Err(EvalexprError::CustomMessage(
            "inNetwork(): network must be CIDR or an IPv4 octet range like 192.168.1-3.10-12"
                .into(),
        ));
    }

    for (ip_part, net_part) in ip_parts.iter().zip(net_parts.iter()) {
        if ip_part == net_part {
            continue;
        }

        let octet: i64 = ip_part.parse().map_err(|_| {
            EvalexprError::CustomMessage(format!("inNetwork(): invalid octet '{ip_part}'"))
        })?;

        let bounds: Vec<&str> = net_part.split('-').collect();
        if bounds.len() == 1 {
            // a fixed octet that failed the string compare
            return Ok(false);
        }
        if bounds.len() != 2 {
            return Err(EvalexprError::CustomMessage(format!(
                "inNetwork(): invalid octet range '{net_part}'"
            )));
        }

        let lower: i64 = bounds[0].parse().map_err(|_| {
            EvalexprError::CustomMessage(format!("inNetwork(): invalid octet range '{net_part}'"))
        })?;
        let upper: i64 = bounds[1].parse().map_err(|_| {
            EvalexprError::CustomMessage(format!("inNetwork(): invalid octet range '{net_part}'"))
        })?;

        if octet < lower || octet > upper {
            return Ok(false);
        }
    }

    Ok(true)
}

fn accept(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    match args.len() {
        0 => Ok(encode_verdict(&Verdict::Accept)),
        1 => {
            if bool_arg(&args, 0, "accept")? {
                Ok(encode_verdict(&Verdict::Accept))
            } else {
                Ok(encode_verdict(&Verdict::Noop))
            }
        }
        _ => Err(wrong_arity("accept")),
    }
}

fn reject(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    if args.is_empty() {
        return Ok(encode_verdict(&Verdict::reject()));
    }
    if args.len() > 2 {
        return Err(wrong_arity("reject"));
    }

    if !bool_arg(&args, 0, "reject")? {
        return Ok(encode_verdict(&Verdict::Noop));
    }

    let code = if args.len() == 2 {
        ResponseCode::from_low(int_arg(&args, 1, "reject")? as u8)
    } else {
        ResponseCode::Refused
    };

    Ok(encode_verdict(&Verdict::Reject { code }))
}

fn mark(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);

    let matched = if args.is_empty() {
        true
    } else {
        bool_arg(&args, 0, "mark")?
    };

    let amount = if args.len() >= 2 {
        int_arg(&args, 1, "mark")?
    } else {
        1
    };

    let mut labels = Vec::new();
    for index in 2..args.len() {
        labels.push(str_arg(&args, index, "mark")?);
    }

    if matched {
        Ok(encode_verdict(&Verdict::Mark { amount, labels }))
    } else {
        Ok(encode_verdict(&Verdict::Noop))
    }
}

fn sinkhole(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    if args.len() != 2 {
        return Err(wrong_arity("sinkhole"));
    }

    let matched = bool_arg(&args, 0, "sinkhole")?;
    let destination = str_arg(&args, 1, "sinkhole")?;

    if matched {
        Ok(encode_verdict(&Verdict::Sinkhole { destination }))
    } else {
        Ok(encode_verdict(&Verdict::Noop))
    }
}

fn is_subdomain_fn(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    if args.len() != 2 {
        return Err(wrong_arity("isSubdomain"));
    }

    let child = str_arg(&args, 0, "isSubdomain")?;
    let parent = str_arg(&args, 1, "isSubdomain")?;

    Ok(Value::Boolean(is_subdomain(&parent, &child)?))
}

fn in_network_fn(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    if args.len() != 2 {
        return Err(wrong_arity("inNetwork"));
    }

    let target = str_arg(&args, 0, "inNetwork")?;
    let network = str_arg(&args, 1, "inNetwork")?;

    Ok(Value::Boolean(in_network(&target, &network)?))
}

fn is_subdomain_from_list(argument: &Value) -> EvalexprResult<Value> {
    let args = args_of(argument);
    if args.len() < 2 {
        return Err(wrong_arity("isSubdomainFromList"));
    }

    let child = str_arg(&args, 0, "isSubdomainFromList")?;
    for index in 1..args.len() {
        let parent = str_arg(&args, index, "isSubdomainFromList")?;
        if is_subdomain(&parent, &child).unwrap_or(false) {
            return Ok(Value::Boolean(true));
        }
    }

    Ok(Value::Boolean(false))
}

/// Registers the verdict and utility functions available to every rule.
pub(super) fn register_intrinsics(ctx: &mut HashMapContext) -> EvalexprResult<()> {
    ctx.set_function("accept".into(), Function::new(accept))?;
    ctx.set_function("reject".into(), Function::new(reject))?;
    ctx.set_function("mark".into(), Function::new(mark))?;
    ctx.set_function("sinkhole".into(), Function::new(sinkhole))?;
    ctx.set_function("isSubdomain".into(), Function::new(is_subdomain_fn))?;
    ctx.set_function("inNetwork".into(), Function::new(in_network_fn))?;
    ctx.set_function(
        "isSubdomainFromList".into(),
        Function::new(is_subdomain_from_list),
    )?;
    Ok(())
}
