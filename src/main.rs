use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use fib_handoff::compute::{ComputeAgent, ComputeCommand};
use fib_handoff::config::{DEFAULT_MESSAGE_DELAY_MS, Timing};
use fib_handoff::peer::{Agent, Peer, spawn_peer};
use fib_handoff::relay::handlers::{STATUS_ENDPOINT, router};
use fib_handoff::relay::service::RelayHandle;
use fib_handoff::relay::types::RelayStatus;
use fib_handoff::storage::{FileSnapshotStore, StorageAgent, StorageCommand};

#[derive(Parser)]
#[command(name = "fib-handoff")]
#[command(about = "Fibonacci computation split between a compute peer and a storage peer")]
struct Cli {
    /// Simulated delay applied to every message, in milliseconds
    #[arg(long, global = true, env = "FIB_LATENCY_MS", default_value_t = DEFAULT_MESSAGE_DELAY_MS)]
    latency_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay
    Relay {
        #[arg(long, env = "FIB_BIND", default_value = "127.0.0.1:3001")]
        bind: SocketAddr,
    },
    /// Join the relay as the compute peer. Reads targets (or "reconnect") from stdin.
    Compute {
        #[arg(long, env = "FIB_RELAY_URL", default_value = "ws://127.0.0.1:3001/ws")]
        relay: String,

        /// Target to start with once the role is confirmed
        #[arg(long, allow_negative_numbers = true)]
        target: Option<i64>,
    },
    /// Join the relay as the storage peer. Reads "disconnect"/"reconnect" from stdin.
    Storage {
        #[arg(long, env = "FIB_RELAY_URL", default_value = "ws://127.0.0.1:3001/ws")]
        relay: String,

        #[arg(long, env = "FIB_STATE_PATH", default_value = "fibonacci-state.json")]
        state: PathBuf,
    },
    /// Print the relay's role bindings
    Status {
        #[arg(long, default_value = "http://127.0.0.1:3001")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let timing = Timing::with_message_delay_ms(cli.latency_ms);

    match cli.command {
        Command::Relay { bind } => run_relay(bind, timing).await,
        Command::Compute { relay, target } => run_compute(relay, target, timing).await,
        Command::Storage { relay, state } => run_storage(relay, state, timing).await,
        Command::Status { url } => print_status(&url).await,
    }
}

async fn run_relay(bind: SocketAddr, timing: Timing) -> Result<()> {
    let relay = RelayHandle::spawn(timing.message_delay);
    let app = router(relay);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("Relay listening on {}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_compute(relay: String, target: Option<i64>, timing: Timing) -> Result<()> {
    let peer = spawn_peer(ComputeAgent::new(timing.countdown_ticks), relay, timing);
    if !wait_for_confirmation(&peer, |status| status.confirmed).await {
        return peer.join().await;
    }

    if let Some(n) = target {
        peer.command(ComputeCommand::StartTarget(n))?;
    }

    drive_from_stdin(&peer, |line| match line {
        "reconnect" => Some(ComputeCommand::RequestReconnect),
        other => match other.parse::<i64>() {
            Ok(n) => Some(ComputeCommand::StartTarget(n)),
            Err(_) => {
                tracing::warn!("Expected a number, \"reconnect\", \"status\" or \"quit\"");
                None
            }
        },
    })
    .await?;

    peer.join().await
}

async fn run_storage(relay: String, state: PathBuf, timing: Timing) -> Result<()> {
    tracing::info!("Persisting snapshots to {}", state.display());
    let peer = spawn_peer(StorageAgent::new(FileSnapshotStore::new(state)), relay, timing);
    if !wait_for_confirmation(&peer, |status| status.confirmed).await {
        return peer.join().await;
    }

    drive_from_stdin(&peer, |line| match line {
        "disconnect" => Some(StorageCommand::Disconnect),
        "reconnect" => Some(StorageCommand::Reconnect),
        _ => {
            tracing::warn!("Expected \"disconnect\", \"reconnect\", \"status\" or \"quit\"");
            None
        }
    })
    .await?;

    peer.join().await
}

/// Returns `false` when the peer stopped before the relay confirmed its role.
async fn wait_for_confirmation<A, F>(peer: &Peer<A>, confirmed: F) -> bool
where
    A: Agent,
    F: Fn(&A::Status) -> bool,
{
    let mut status = peer.status();
    status.wait_for(|s| confirmed(s)).await.is_ok()
}

/// Forwards stdin lines as commands until stdin closes, "quit" is read, or the peer stops.
async fn drive_from_stdin<A, F>(peer: &Peer<A>, parse: F) -> Result<()>
where
    A: Agent,
    A::Status: serde::Serialize,
    F: Fn(&str) -> Option<A::Command>,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = peer.status();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match line.trim() {
                    "" => {}
                    "quit" => std::process::exit(0),
                    "status" => {
                        let current = status.borrow().clone();
                        println!("{}", serde_json::to_string_pretty(&current)?);
                    }
                    other => {
                        if let Some(command) = parse(other) {
                            peer.command(command)?;
                        }
                    }
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
        }
    }
}

async fn print_status(url: &str) -> Result<()> {
    let endpoint = format!("{}{}", url.trim_end_matches('/'), STATUS_ENDPOINT);
    let status: RelayStatus = reqwest::get(&endpoint)
        .await
        .with_context(|| format!("Failed to reach relay at {}", endpoint))?
        .json()
        .await
        .context("Failed to parse relay status")?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
