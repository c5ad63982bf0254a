//! Entry point for `gbn-transfer`.
//!
//! Parses CLI arguments and dispatches into either **send** or **receive**
//! mode.  All protocol work is delegated to library modules; `main.rs` owns
//! only process setup (logging, argument parsing) and the file I/O around a
//! transfer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use gbn_transfer::config::{
    DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_PACKET_SIZE, DEFAULT_PORT, DEFAULT_RETRANSMIT_TIMEOUT,
    DEFAULT_WINDOW_SIZE,
};
use gbn_transfer::simulator::{Simulator, SimulatorConfig};
use gbn_transfer::{receive_payload, send_payload, Channel, Socket, TransferConfig};

/// Reliable file transfer over UDP using Go-Back-N.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send a file to a waiting receiver.
    Send {
        /// File to transfer.
        #[arg(short, long)]
        file: PathBuf,
        /// Receiver address.
        #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
        to: SocketAddr,
        /// Local address to bind (port 0 picks an ephemeral port).
        #[arg(short, long, default_value = "0.0.0.0:0")]
        bind: SocketAddr,
        /// Payload bytes per packet.
        #[arg(long, default_value_t = DEFAULT_PACKET_SIZE)]
        packet_size: usize,
        /// Packets in flight.
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
        window: usize,
        /// Retransmission timeout in milliseconds.
        #[arg(long, default_value_t = DEFAULT_RETRANSMIT_TIMEOUT.as_millis() as u64)]
        timeout_ms: u64,
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Wait for one file and store it.
    Receive {
        /// Local address to bind.
        #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
        bind: SocketAddr,
        /// Where to write the file (defaults to a fresh temp file).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Silence after the first packet that ends the transfer, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_INACTIVITY_TIMEOUT.as_millis() as u64)]
        inactivity_ms: u64,
        #[command(flatten)]
        sim: SimArgs,
    },
}

/// Fault injection on this endpoint's outbound traffic.
#[derive(Args)]
struct SimArgs {
    /// Drop this fraction of outbound datagrams.
    #[arg(long)]
    loss: Option<f64>,
    /// Seed for the loss model.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl SimArgs {
    fn config(&self) -> Option<SimulatorConfig> {
        self.loss.map(|rate| SimulatorConfig::lossy(rate, self.seed))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Send {
            file,
            to,
            bind,
            packet_size,
            window,
            timeout_ms,
            sim,
        } => {
            let config = TransferConfig::default()
                .with_packet_size(packet_size)
                .with_window_size(window)
                .with_retransmit_timeout(Duration::from_millis(timeout_ms));
            let payload = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            log::info!("Sending {} ({} bytes) to {to}", file.display(), payload.len());

            let channel = open_channel(bind, sim.config()).await?;
            let report = send_payload(channel.as_ref(), to, payload, &config).await?;
            println!(
                "Transfer completed: {} packet(s), {} retransmission(s) in {:?}",
                report.stats.packets, report.stats.retransmissions, report.elapsed
            );
        }
        Mode::Receive {
            bind,
            out,
            inactivity_ms,
            sim,
        } => {
            let config = TransferConfig::default()
                .with_inactivity_timeout(Duration::from_millis(inactivity_ms));
            let channel = open_channel(bind, sim.config()).await?;
            let received = receive_payload(channel.as_ref(), &config).await?;

            let path = match out {
                Some(path) => path,
                None => temp_path(),
            };
            store(&path, &received.bytes).await?;
            log::info!(
                "Stored {} bytes ({}) at {}",
                received.bytes.len(),
                received.completion,
                path.display()
            );
            let absolute = std::path::absolute(&path).unwrap_or(path);
            println!("STATUS:FILE_READY:{}", absolute.display());
        }
    }
    Ok(())
}

/// Bind the socket, wrapping it in a simulator when fault injection is on.
async fn open_channel(bind: SocketAddr, sim: Option<SimulatorConfig>) -> Result<Box<dyn Channel>> {
    let socket = Socket::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    log::info!("Bound {}", socket.local_addr);
    let channel: Box<dyn Channel> = match sim {
        Some(cfg) => {
            let sim = Simulator::new(socket, cfg)?;
            log::info!("[sim] outbound faults: {:?}", sim.config());
            Box::new(sim)
        }
        None => Box::new(socket),
    };
    Ok(channel)
}

async fn store(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

/// A fresh `.mp3` path in the system temp directory.
fn temp_path() -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("gbn-{}-{stamp}.mp3", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_defaults() {
        let cli = Cli::try_parse_from(["gbn-transfer", "send", "--file", "song.mp3"]).unwrap();
        let Mode::Send {
            to,
            packet_size,
            window,
            timeout_ms,
            sim,
            ..
        } = cli.mode
        else {
            panic!("expected send mode");
        };
        assert_eq!(to, SocketAddr::from(([127, 0, 0, 1], 10_000)));
        assert_eq!(packet_size, 1024);
        assert_eq!(window, 5);
        assert_eq!(timeout_ms, 100);
        assert!(sim.config().is_none());
    }

    #[test]
    fn receive_flags() {
        let cli = Cli::try_parse_from([
            "gbn-transfer",
            "receive",
            "--out",
            "out.mp3",
            "--inactivity-ms",
            "250",
            "--loss",
            "0.1",
            "--seed",
            "9",
        ])
        .unwrap();
        let Mode::Receive {
            bind,
            out,
            inactivity_ms,
            sim,
        } = cli.mode
        else {
            panic!("expected receive mode");
        };
        assert_eq!(bind.port(), 10_000);
        assert_eq!(out, Some(PathBuf::from("out.mp3")));
        assert_eq!(inactivity_ms, 250);
        let sim = sim.config().unwrap();
        assert_eq!(sim.loss_rate, 0.1);
        assert_eq!(sim.seed, 9);
    }

    #[test]
    fn receive_has_no_packet_size() {
        assert!(Cli::try_parse_from(["gbn-transfer", "receive", "--packet-size", "1024"]).is_err());
    }
}
