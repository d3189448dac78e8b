use palisade_dns_domain::{CliOverrides, ConditionalForward, Config, ListenScheme, Verdict};

#[test]
fn test_conditional_forward_parses_host_port_and_expression() {
    let forward: ConditionalForward = "8.8.4.4:53=isSubdomain(request.Name, \"orf.at.\")"
        .parse()
        .unwrap();
    assert_eq!(forward.upstream, "8.8.4.4:53".parse().unwrap());
    assert_eq!(forward.expression, "isSubdomain(request.Name, \"orf.at.\")");
}

#[test]
fn test_conditional_forward_keeps_equals_in_expression() {
    let forward: ConditionalForward = "1.1.1.1:53=request.Type == \"A\"".parse().unwrap();
    assert_eq!(forward.expression, "request.Type == \"A\"");
}

#[test]
fn test_conditional_forward_rejects_missing_expression() {
    assert!("8.8.8.8:53".parse::<ConditionalForward>().is_err());
    assert!("8.8.8.8:53=".parse::<ConditionalForward>().is_err());
}

#[test]
fn test_default_listener_when_none_given() {
    let config = Config::load(None, CliOverrides::default()).unwrap();
    assert_eq!(config.listen.len(), 1);
    assert_eq!(config.listen[0].scheme, ListenScheme::Udp);
    assert_eq!(config.listen[0].addr, "127.0.0.1:5353".parse().unwrap());
}

#[test]
fn test_listen_all_expands_to_udp_and_tcp() {
    let overrides = CliOverrides {
        listen_all: true,
        ..Default::default()
    };
    let config = Config::load(None, overrides).unwrap();

    assert_eq!(config.listen.len(), 2);
    assert_eq!(config.listen[0].scheme, ListenScheme::Udp);
    assert_eq!(config.listen[1].scheme, ListenScheme::Tcp);
    assert!(config.listen.iter().all(|l| l.addr.port() == 53));
}

#[test]
fn test_zone_flags_must_come_together() {
    let overrides = CliOverrides {
        zone_file: Some("example.zone".into()),
        ..Default::default()
    };
    assert!(Config::load(None, overrides).is_err());
}

#[test]
fn test_sinkhole_requires_predicates() {
    let overrides = CliOverrides {
        sinkhole: Some("127.0.0.1".parse().unwrap()),
        ..Default::default()
    };
    assert!(Config::load(None, overrides).is_err());
}

#[test]
fn test_forwarders_override() {
    let overrides = CliOverrides {
        forwarders: vec!["8.8.8.8:53".parse().unwrap()],
        ..Default::default()
    };
    let config = Config::load(None, overrides).unwrap();
    assert_eq!(config.forward.upstreams, vec!["8.8.8.8:53".parse().unwrap()]);
}

#[test]
fn test_noop_default_verdict_decays_to_accept() {
    assert_eq!(Verdict::Noop.or_accept(), Verdict::Accept);
    assert_eq!(Verdict::reject().or_accept(), Verdict::reject());
}
