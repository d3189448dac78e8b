use clap::Parser;
use palisade_dns_domain::{CliOverrides, ConditionalForward, ListenEndpoint};
use palisade_dns_infrastructure::dns::server::DnsServer;
use palisade_dns_infrastructure::jobs::CacheEvictionJob;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod bootstrap;
mod stack;

#[derive(Parser)]
#[command(name = "palisade-dns")]
#[command(version)]
#[command(about = "Programmable DNS firewall and forwarder")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File containing INPUT rules, one expression per line
    #[arg(short = 'i', long, value_name = "FILE")]
    input_rules: Option<PathBuf>,

    /// File containing OUTPUT rules, one expression per line
    #[arg(short = 'o', long, value_name = "FILE")]
    output_rules: Option<PathBuf>,

    /// Zone file to serve (bind format)
    #[arg(short = 'z', long, value_name = "FILE")]
    zone: Option<PathBuf>,

    /// Zone origin
    #[arg(short = 'n', long, value_name = "NAME")]
    origin: Option<String>,

    /// Upstream DNS server as host:port (repeatable)
    #[arg(short = 'f', long = "forwarder", value_name = "ADDR")]
    forwarders: Vec<SocketAddr>,

    /// Conditional upstream as host:port=expression (repeatable)
    #[arg(short = 'F', long = "forward-if", value_name = "ADDR=EXPR")]
    forward_if: Vec<ConditionalForward>,

    /// Listen endpoint as scheme://host:port, schemes udp and tcp (repeatable)
    #[arg(short = 'l', long = "listen", value_name = "ENDPOINT")]
    listen: Vec<ListenEndpoint>,

    /// Listen on :53 for both UDP and TCP
    #[arg(short = 'L', long = "listen-all")]
    listen_all: bool,

    /// Sinkhole destination address
    #[arg(long, value_name = "ADDR")]
    sinkhole: Option<IpAddr>,

    /// Sinkhole predicate expression (repeatable)
    #[arg(long = "sinkhole-if", value_name = "EXPR")]
    sinkhole_if: Vec<String>,

    /// Append served conversations to this JSONL file
    #[arg(long, value_name = "FILE")]
    persist: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_overrides(self) -> (Option<PathBuf>, CliOverrides) {
        let config = self.config;
        let overrides = CliOverrides {
            listen: self.listen,
            listen_all: self.listen_all,
            input_rules: self.input_rules,
            output_rules: self.output_rules,
            zone_file: self.zone,
            zone_origin: self.origin,
            forwarders: self.forwarders,
            forward_if: self.forward_if,
            sinkhole: self.sinkhole,
            sinkhole_if: self.sinkhole_if,
            persist: self.persist,
            log_level: self.log_level,
        };
        (config, overrides)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config_path, overrides) = Cli::parse().into_overrides();

    let config = bootstrap::load_config(config_path.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!("starting palisade-dns v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();

    let built = stack::build(&config).await?;

    if let Some(cache) = built.cache {
        Arc::new(
            CacheEvictionJob::new(cache)
                .with_interval(Duration::from_secs(config.cache.eviction_interval_secs))
                .with_cancellation(shutdown.clone()),
        )
        .start();
    }

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    let server = DnsServer::new(config.listen.clone(), built.middleware, shutdown);
    server.listen_and_serve().await?;

    info!("shutdown complete");
    Ok(())
}
