//! xds-gateway - Envoy v2 REST discovery gateway
//!
//! Serves discovery responses from in-memory stores that an embedded refresh
//! pipeline publishes into.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default 0.0.0.0:8080
//! xds-gateway
//!
//! # Custom address and a longer drain
//! XDS_GATEWAY_LISTEN=127.0.0.1:9000 xds-gateway --grace-period-secs 15
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xds_gateway::prelude::*;
use xds_gateway::server::DEFAULT_LISTEN_ADDR;

/// Envoy v2 REST discovery gateway
#[derive(Parser, Debug)]
#[command(name = "xds-gateway")]
#[command(about = "Serves precomputed xDS responses over HTTP")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "XDS_GATEWAY_LISTEN", default_value_t = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Maximum request body size in bytes
    #[arg(long, env = "XDS_GATEWAY_MAX_REQUEST_SIZE", default_value_t = 4 * 1024 * 1024)]
    max_request_size: usize,

    /// Seconds in-flight requests may run after SIGTERM/SIGINT
    #[arg(long, env = "XDS_GATEWAY_GRACE_PERIOD_SECS", default_value_t = 5)]
    grace_period_secs: u64,

    /// Disable request metrics
    #[arg(long, env = "XDS_GATEWAY_NO_METRICS")]
    no_metrics: bool,

    /// Log filter directive (e.g. "info,xds_server=debug")
    #[arg(long, env = "XDS_GATEWAY_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&args.log)?)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let endpoints = Arc::new(EndpointStore::new());
    let store = Arc::new(ConfigStore::new());

    let mut builder = XdsServer::builder()
        .endpoints(endpoints)
        .config_store(store)
        .listen_addr(args.listen)
        .max_request_size(args.max_request_size)
        .grace_period(Duration::from_secs(args.grace_period_secs));
    if args.no_metrics {
        builder = builder.disable_metrics();
    }
    let server = builder.build()?;

    info!(
        version = xds_gateway::version::VERSION,
        listen = %args.listen,
        "starting xds-gateway"
    );
    server.serve().await?;

    Ok(())
}
