//! Process entry point: parses the one CLI flag, wires the cache, waiter
//! table, outstanding-reply gate and resolver engine together, binds both
//! sockets and runs the client and upstream read loops to completion
//! (i.e. forever).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use rdns_cache::{Cache, OutstandingGate, WaiterTable};
use rdns_resolver::Engine;
use rdns_server::upstream::UdpUpstreamSender;
use tokio::net::UdpSocket;

/// Recursive, caching DNS resolver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client-facing listen port.
    #[arg(short = 'p', long = "port", default_value_t = 53, env = "RDNS_PORT")]
    port: u16,
}

fn init_logs() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, registry, EnvFilter};

    let _ = registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}=info", env!("CARGO_PKG_NAME")).into()
        }))
        .with(fmt::layer().with_ansi(cfg!(debug_assertions)))
        .try_init();
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_logs();
    let args = Args::parse();

    let client_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), args.port);
    tracing::info!(%client_addr, "starting client-facing socket");
    let client_socket = Arc::new(UdpSocket::bind(client_addr).await?);

    // Ephemeral local port for upstream traffic.
    let upstream_socket = Arc::new(UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?);
    tracing::info!(
        upstream_addr = %upstream_socket.local_addr()?,
        "bound upstream-facing socket"
    );

    let cache = Arc::new(Cache::new());
    let waiters = Arc::new(WaiterTable::new());
    let gate = Arc::new(OutstandingGate::new());

    let engine = Arc::new(Engine::new(
        cache.clone(),
        waiters.clone(),
        gate.clone(),
        UdpUpstreamSender::new(upstream_socket.clone()),
    ));

    let upstream_loop = tokio::spawn(rdns_server::run_upstream_loop(
        upstream_socket,
        cache,
        waiters,
        gate,
    ));
    let client_loop = tokio::spawn(rdns_server::run_client_loop(client_socket, engine));

    tokio::select! {
        result = client_loop => {
            tracing::error!(?result, "client loop exited");
        }
        result = upstream_loop => {
            tracing::error!(?result, "upstream loop exited");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
