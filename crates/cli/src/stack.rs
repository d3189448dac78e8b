use palisade_dns_application::rules::{read_rules, RuleEngine};
use palisade_dns_application::session::Middleware;
use palisade_dns_domain::{Config, Verdict};
use palisade_dns_infrastructure::dns::cache::{CacheMiddleware, ResponseCache};
use palisade_dns_infrastructure::dns::forwarding::Forwarder;
use palisade_dns_infrastructure::dns::log::QueryLogger;
use palisade_dns_infrastructure::dns::sinkhole::Sinkhole;
use palisade_dns_infrastructure::dns::zone::{Zone, ZoneProvider};
use palisade_dns_infrastructure::persistence::{JsonlConversationWriter, Persister};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The assembled middleware stack plus the shared cache handle (for the
/// background eviction job).
pub struct BuiltStack {
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub cache: Option<Arc<ResponseCache>>,
}

/// Builds the middleware stack from the configuration, in serving order:
/// log, persistence, rules, zone, sinkhole, cache, forwarder.
pub async fn build(config: &Config) -> anyhow::Result<BuiltStack> {
    let mut middleware: Vec<Arc<dyn Middleware>> = vec![Arc::new(QueryLogger::new())];

    if let Some(persistence) = &config.persistence {
        let writer = JsonlConversationWriter::open(&persistence.file).await?;
        info!(file = %persistence.file.display(), "persisting conversations");
        middleware.push(Arc::new(Persister::new(Arc::new(writer))));
    }

    let input_rules = match &config.rules.input {
        Some(path) => read_rules(path)?,
        None => Vec::new(),
    };
    let output_rules = match &config.rules.output {
        Some(path) => read_rules(path)?,
        None => Vec::new(),
    };
    info!(
        input_rules = input_rules.len(),
        output_rules = output_rules.len(),
        "rule engine loaded"
    );
    middleware.push(Arc::new(RuleEngine::new(
        Verdict::Accept,
        Verdict::Accept,
        input_rules,
        output_rules,
    )));

    if let Some(zone_config) = &config.zone {
        let zone = Zone::load(&zone_config.file, &zone_config.origin)?;
        info!(origin = %zone.origin(), records = zone.records().len(), "zone loaded");
        middleware.push(Arc::new(ZoneProvider::new(vec![zone])));
    }

    if let Some(sinkhole_config) = &config.sinkhole {
        let sinkhole = Sinkhole::from_rules(sinkhole_config.destination, &sinkhole_config.rules)?;
        info!(destination = %sinkhole_config.destination, "sinkhole enabled");
        middleware.push(Arc::new(sinkhole));
    }

    let mut cache = None;
    if config.cache.enabled {
        let shared = Arc::new(ResponseCache::new());
        middleware.push(Arc::new(CacheMiddleware::new(Arc::clone(&shared))));
        cache = Some(shared);
    }

    if !config.forward.upstreams.is_empty() || !config.forward.conditional.is_empty() {
        let mut forwarder = Forwarder::from_config(
            config.forward.upstreams.clone(),
            &config.forward.conditional,
        )?;
        if let Some(timeout_ms) = config.forward.timeout_ms {
            forwarder = forwarder.with_timeout(Duration::from_millis(timeout_ms));
        }
        info!(
            upstreams = config.forward.upstreams.len(),
            conditional = config.forward.conditional.len(),
            "forwarder enabled"
        );
        middleware.push(Arc::new(forwarder));
    }

    Ok(BuiltStack { middleware, cache })
}
