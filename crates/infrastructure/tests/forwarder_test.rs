mod helpers;

use helpers::*;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use palisade_dns_application::rules::Expr;
use palisade_dns_application::session::Middleware;
use palisade_dns_domain::DomainError;
use palisade_dns_infrastructure::dns::forwarding::Forwarder;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_default_upstreams_are_tried_in_order() {
    // first upstream is dead; the second answers
    let dead: std::net::SocketAddr = "192.0.2.254:53".parse().unwrap();
    let alive = MockUpstream::start([9, 9, 9, 9].into(), 300).await;

    let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(
        Forwarder::new(vec![dead, alive.addr()], Vec::new())
            .with_timeout(Duration::from_millis(200)),
    )];

    let sink = WriteSink::new();
    run_session(stack, make_request("example.com.", RecordType::A), sink.clone())
        .await
        .unwrap();

    let written = sink.messages();
    assert_eq!(written[0].response_code(), ResponseCode::NoError);
    assert_eq!(written[0].answers()[0].data().unwrap().to_string(), "9.9.9.9");
    assert_eq!(alive.hits(), 1);
}

#[tokio::test]
async fn test_failed_conditional_exchange_rejects_with_nxdomain() {
    // the predicate selects a dead upstream; the defaults must not be tried
    let dead: std::net::SocketAddr = "192.0.2.254:53".parse().unwrap();
    let fallback = MockUpstream::start([8, 8, 8, 8].into(), 300).await;

    let expr = Expr::new("isSubdomain(request.Name, \"orf.at.\")").unwrap();
    let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(
        Forwarder::new(vec![fallback.addr()], vec![(dead, expr)])
            .with_timeout(Duration::from_millis(200)),
    )];

    let sink = WriteSink::new();
    let result = run_session(stack, make_request("news.orf.at.", RecordType::A), sink.clone()).await;

    assert!(result.is_err());
    assert_eq!(sink.messages()[0].response_code(), ResponseCode::NXDomain);
    assert_eq!(fallback.hits(), 0);
}

#[tokio::test]
async fn test_erroring_conditional_predicate_is_skipped() {
    // the predicate produces an integer, not a bool; the forwarder logs it
    // and falls back to the default upstreams
    let conditional = MockUpstream::start([8, 8, 4, 4].into(), 300).await;
    let fallback = MockUpstream::start([8, 8, 8, 8].into(), 300).await;

    let expr = Expr::new("1 + 1").unwrap();
    let stack: Vec<Arc<dyn Middleware>> = vec![Arc::new(
        Forwarder::new(vec![fallback.addr()], vec![(conditional.addr(), expr)])
            .with_timeout(Duration::from_millis(500)),
    )];

    let sink = WriteSink::new();
    run_session(stack, make_request("example.com.", RecordType::A), sink.clone())
        .await
        .unwrap();

    assert_eq!(conditional.hits(), 0);
    assert_eq!(fallback.hits(), 1);
    assert_eq!(sink.messages()[0].answers()[0].data().unwrap().to_string(), "8.8.8.8");
}

#[tokio::test]
async fn test_forwarder_without_upstreams_yields() {
    let stack: Vec<Arc<dyn Middleware>> =
        vec![Arc::new(Forwarder::new(Vec::new(), Vec::new()))];

    let sink = WriteSink::new();
    let result = run_session(stack, make_request("example.com.", RecordType::A), sink.clone()).await;

    assert!(matches!(result, Err(DomainError::NotServed)));
    assert_eq!(sink.messages()[0].response_code(), ResponseCode::ServFail);
}
