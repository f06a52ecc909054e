// Links in the allocator crate, which sets the global allocator to jemalloc.
extern crate kvnode_allocator;

mod connection;
mod metrics_server;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kvnode_core::{AdmissionGate, Dispatcher, DEFAULT_MAX_BATCH};
use kvnode_proposer::{InMemoryLog, ProposalMode, ProposerAdapter};
use kvnode_store::{InMemoryStore, Store};

/// A Redis-wire-compatible replicated key-value node: command dispatch,
/// validation, and write-proposal core in front of an in-memory
/// reference store and consensus log.
#[derive(Debug, Parser)]
#[command(about, version)]
pub struct Cli {
    /// Address to listen on for client connections.
    #[arg(long, default_value = "0.0.0.0", env = "KVNODE_LISTEN_HOST")]
    listen_host: String,
    /// Port to listen on for client connections.
    #[arg(long, default_value = "6380", env = "KVNODE_PORT")]
    port: u16,
    /// Port to listen on for Prometheus metrics scrapes.
    #[arg(long, default_value = "6381", env = "METRICS_PORT")]
    metrics_port: u16,

    /// Maximum number of keys (or key/value pairs) a batch command may
    /// carry before it's rejected with `BATCH_TOO_LARGE` (§4.3).
    #[arg(long, default_value_t = DEFAULT_MAX_BATCH, env = "MAX_BATCH")]
    max_batch: usize,

    /// Start with the admission gate closed, accepting only an external
    /// syncer's writes (§4.4). Can be changed later by whatever
    /// administrative surface flips the gate; out of scope here.
    #[arg(long, env = "SYNCER_ONLY")]
    syncer_only: bool,

    /// Use the V2 proposer encoding, which lets the store route a
    /// still-namespaced multi-key frame itself, instead of V1 (single-key
    /// writes only, namespace already stripped by the caller). See §4.5
    /// and the REDESIGN FLAGS decision in DESIGN.md.
    #[arg(long, env = "PROPOSE_V2")]
    propose_v2: bool,

    /// Maximum number of concurrent client connections.
    #[arg(long, default_value = "1000", env = "MAX_CONNECTIONS")]
    max_connections: usize,

    /// How long an idle connection may go without a request before the
    /// server closes it.
    #[arg(long, value_parser = humantime::parse_duration, default_value = "10m", env = "IDLE_SESSION_TIMEOUT")]
    idle_session_timeout: std::time::Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kvnode_ops::install();

    let cli = Cli::parse();

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::default());
    let mode = if cli.propose_v2 {
        ProposalMode::V2
    } else {
        ProposalMode::V1
    };
    let proposer = Arc::new(ProposerAdapter::new(Arc::new(InMemoryLog::new()), mode));
    let gate = Arc::new(AdmissionGate::new(cli.syncer_only));
    let dispatcher = Dispatcher::new(store, proposer, gate, cli.max_batch);

    let cancel_token = tokio_util::sync::CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c, initiating shutdown");
        ctrl_c_token.cancel();
    });

    let metrics_addr: std::net::SocketAddr = format!("0.0.0.0:{}", cli.metrics_port).parse()?;
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .context("failed to bind metrics port")?;
    let metrics_router = metrics_server::build_router();
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_router).await {
            tracing::error!(%err, "metrics server exited");
        }
    });

    let listen_addr = format!("{}:{}", cli.listen_host, cli.port);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    tracing::info!(%listen_addr, mode = ?mode, "kvnode-server listening");

    let connection_limit = Arc::new(tokio::sync::Semaphore::new(cli.max_connections));

    loop {
        tokio::select! {
            accept = listener.accept() => {
                let (socket, addr) = match accept {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(%err, "failed to accept connection");
                        continue;
                    }
                };
                let dispatcher = dispatcher.clone();
                let connection_limit = connection_limit.clone();
                let stop = cancel_token.child_token();
                let idle_timeout = cli.idle_session_timeout;
                tokio::spawn(async move {
                    if let Err(err) = connection::serve(dispatcher, socket, addr, connection_limit, idle_timeout, stop).await {
                        tracing::warn!(%err, %addr, "connection ended with error");
                    }
                });
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    Ok(())
}
