//! Reference harness for the `rdt` crate.
//!
//! Run two instances against each other over loopback or a real network:
//!
//! ```text
//! rdt-demo 127.0.0.1 9000 4 0.5                                   # sink
//! rdt-demo 127.0.0.1 9001 4 0.5 --peer-ip 127.0.0.1 --peer-port 9000 --count 10   # source
//! ```
//!
//! A side with `--peer-ip`/`--peer-port` acts as the source: it sends
//! `"testing 0"` .. `"testing <count-1>"` and exits once the engine has
//! drained. A side without a peer acts as the sink: it prints every payload
//! it receives, verifying they arrive in the expected order, until
//! interrupted.

use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Local address to bind to.
    my_ip: String,
    /// Local port to bind to.
    my_port: u16,
    /// Sliding-window size, in packets.
    window_size: u16,
    /// Retransmission timeout, in seconds.
    timeout_secs: f64,

    /// Probability, in [0, 1], of simulating a lost outbound packet.
    #[arg(long, default_value_t = 0.0)]
    disc_prob: f64,

    /// Peer address. Present on the sending side; absent on the
    /// receiving side, which instead learns the peer from the first
    /// datagram.
    #[arg(long, requires = "peer_port")]
    peer_ip: Option<String>,
    #[arg(long, requires = "peer_ip")]
    peer_port: Option<u16>,

    /// Number of `"testing N"` payloads to send. Only meaningful with
    /// `--peer-ip`/`--peer-port`.
    #[arg(long, default_value_t = 10)]
    count: u32,
}

#[async_std::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("only set once");

    if let Err(error) = run().await {
        error!("{error:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let local: SocketAddr = format!("{}:{}", args.my_ip, args.my_port)
        .parse()
        .context("invalid local address")?;

    if args.timeout_secs <= 0.0 {
        bail!("timeout-secs must be positive");
    }

    let mut config = rdt::RdtConfig::new(
        args.window_size,
        Duration::from_secs_f64(args.timeout_secs),
    )
    .with_disc_prob(args.disc_prob);

    let peer = match (&args.peer_ip, args.peer_port) {
        (Some(ip), Some(port)) => {
            let peer: SocketAddr = format!("{ip}:{port}")
                .parse()
                .context("invalid peer address")?;
            config = config.with_peer(peer);
            Some(peer)
        }
        _ => None,
    };

    let endpoint = rdt::Rdt::bind(local, config)
        .await
        .context("failed to bind local socket")?;
    info!("Bound to {}", endpoint.local_addr());

    if peer.is_some() {
        run_source(&endpoint, args.count).await;
    } else {
        run_sink(&endpoint).await;
    }

    endpoint.stop().await;
    Ok(())
}

async fn run_source(endpoint: &rdt::Rdt, count: u32) {
    for n in 0..count {
        let payload = format!("testing {n}");
        info!("Sending {payload:?}");
        endpoint.send(payload).await;
    }
}

async fn run_sink(endpoint: &rdt::Rdt) {
    let mut expected = 0u32;
    loop {
        let Some(payload) = endpoint.receive().await else {
            break;
        };

        let want = format!("testing {expected}");
        if payload == want {
            info!("Received {payload:?} (in order)");
        } else {
            error!("Received {payload:?}, expected {want:?}");
        }
        expected += 1;
    }
}
