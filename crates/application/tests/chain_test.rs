mod helpers;

use helpers::make_request;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use palisade_dns_application::rules::{parse_rules, Chain, Rule};
use palisade_dns_domain::Verdict;
use std::sync::Arc;

fn rule(expression: &str) -> Arc<Rule> {
    Arc::new(Rule::new(expression).unwrap())
}

#[test]
fn test_empty_chain_returns_default() {
    let chain = Chain::new("INPUT", Verdict::Accept, Vec::new());
    let request = make_request("example.com.", RecordType::A);

    assert_eq!(chain.verdict(&request, None, None).unwrap(), Verdict::Accept);
}

#[test]
fn test_noop_default_is_normalized_to_accept() {
    let chain = Chain::new("INPUT", Verdict::Noop, Vec::new());
    let request = make_request("example.com.", RecordType::A);

    assert_eq!(chain.verdict(&request, None, None).unwrap(), Verdict::Accept);
}

#[test]
fn test_first_decisive_verdict_wins() {
    let chain = Chain::new(
        "INPUT",
        Verdict::Accept,
        vec![
            rule("reject(false)"),
            rule("reject(isSubdomain(request.Name, \"evil.example.\"))"),
            rule("reject(true, 3)"),
        ],
    );

    let request = make_request("a.evil.example.", RecordType::A);
    assert_eq!(
        chain.verdict(&request, None, None).unwrap(),
        Verdict::Reject {
            code: ResponseCode::Refused
        }
    );
}

#[test]
fn test_noop_rules_fall_through_to_default() {
    let chain = Chain::new(
        "INPUT",
        Verdict::Accept,
        vec![rule("reject(false)"), rule("accept(false)")],
    );

    let request = make_request("example.com.", RecordType::A);
    assert_eq!(chain.verdict(&request, None, None).unwrap(), Verdict::Accept);
}

#[test]
fn test_erroring_rule_is_skipped_and_chain_continues() {
    // the first rule produces a bare string: a runtime type error for a
    // verdict chain. The second rule must still be evaluated.
    let chain = Chain::new(
        "INPUT",
        Verdict::Accept,
        vec![rule("\"not a verdict\""), rule("reject(true)")],
    );

    let request = make_request("example.com.", RecordType::A);
    assert_eq!(
        chain.verdict(&request, None, None).unwrap(),
        Verdict::Reject {
            code: ResponseCode::Refused
        }
    );
}

#[test]
fn test_erroring_rule_alone_yields_default() {
    let chain = Chain::new("INPUT", Verdict::Accept, vec![rule("\"not a verdict\"")]);

    let request = make_request("example.com.", RecordType::A);
    assert_eq!(chain.verdict(&request, None, None).unwrap(), Verdict::Accept);
}

#[test]
fn test_match_counter_counts_only_decisive_verdicts() {
    let noop_rule = rule("reject(false)");
    let hit_rule = rule("reject(isSubdomain(request.Name, \"evil.example.\"))");
    let chain = Chain::new(
        "INPUT",
        Verdict::Accept,
        vec![noop_rule.clone(), hit_rule.clone()],
    );

    let evil = make_request("a.evil.example.", RecordType::A);
    let clean = make_request("www.example.com.", RecordType::A);

    chain.verdict(&evil, None, None).unwrap();
    chain.verdict(&evil, None, None).unwrap();
    chain.verdict(&clean, None, None).unwrap();

    assert_eq!(noop_rule.matches(), 0);
    assert_eq!(hit_rule.matches(), 2);
}

#[test]
fn test_add_rule_appends_in_order() {
    let chain = Chain::new("INPUT", Verdict::Accept, vec![rule("accept(false)")]);
    chain.add_rule(rule("reject(true)"));

    assert_eq!(chain.len(), 2);
    let request = make_request("example.com.", RecordType::A);
    assert_eq!(
        chain.verdict(&request, None, None).unwrap(),
        Verdict::reject()
    );
}

// ── rule files ─────────────────────────────────────────────────────────────

#[test]
fn test_parse_rules_skips_blanks_and_comments() {
    let source = "\n# input policy\nreject(isSubdomain(request.Name, \"evil.example.\"))\n\naccept()\n";
    let rules = parse_rules(source, "input.rules").unwrap();
    assert_eq!(rules.len(), 2);
}

#[test]
fn test_parse_rules_reports_file_and_line() {
    let source = "accept()\nreject((\n";
    let err = parse_rules(source, "input.rules").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("input.rules"));
    assert!(message.contains(":2"));
}
