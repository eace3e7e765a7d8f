//! ringnet CLI: run a peer, generate an identity keypair, or issue a ring
//! admission ticket for another peer's public key.

mod config;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand};
use config::Config;
use ringnet_core::config::{DiscoveryAddress, IdentityPaths, PeerConfig};
use ringnet_core::{Event, Peer};
use ringnet_transport::factory::{TransportFactory, TransportFactoryConfig};
use ringnet_transport::Transport;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ringnet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path.
    #[arg(short, long, default_value = "ringnet.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a peer and run until interrupted.
    Run,
    /// Generate a fresh identity keypair.
    Keygen {
        /// Where to write the private key.
        #[arg(long, default_value = "private.pem")]
        private_key: String,
        /// Where to write the public key.
        #[arg(long, default_value = "public.pem")]
        public_key: String,
    },
    /// Issue a ring admission ticket for a peer's public key (the ring
    /// authority's own tool; see `ringnet_crypto::identity::issue_ring_signature`).
    RingSign {
        /// The ring authority's private key.
        #[arg(long)]
        ring_private_key: String,
        /// The peer's public key being admitted.
        #[arg(long)]
        peer_public_key: String,
        /// Where to write the base64 signature.
        #[arg(long, default_value = "signature.b64")]
        out: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = PathBuf::from(&cli.config);
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::load_or_default()?
    };
    config.validate()?;

    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::fmt().with_env_filter(level).init();

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Keygen { private_key, public_key } => keygen(private_key, public_key),
        Commands::RingSign {
            ring_private_key,
            peer_public_key,
            out,
        } => ring_sign(ring_private_key, peer_public_key, out),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let transport = TransportFactory::create(TransportFactoryConfig::new(
        config.network.bind_addr,
        config.network.cert_path.clone(),
        config.network.key_path.clone(),
    ))
    .await?;

    let peer_config = PeerConfig {
        listen_port: config.network.bind_addr.port(),
        public_address: config.network.public_address,
        discovery_addresses: config.discovery.peers.iter().map(|p| parse_discovery_peer(p)).collect(),
        discovery: ringnet_discovery::DiscoveryConfig {
            own_port: config.network.bind_addr.port(),
            ..Default::default()
        },
        start_discovery: config.discovery.start_on_boot,
        identity: IdentityPaths {
            private_key: config.identity.private_key,
            public_key: config.identity.public_key,
            ring_public_key: config.identity.ring_public_key,
            signature: config.identity.signature,
        },
        require_confirmation: config.network.require_confirmation,
        debug: false,
    };

    let peer = Peer::start(peer_config, Arc::new(transport) as Arc<dyn Transport>).await?;

    peer.on("connection", |event| {
        if let Event::Connection { remote_address, .. } = event {
            tracing::info!(remote = %remote_address, "peer trusted");
        }
    });
    peer.on("message", |event| {
        if let Event::Message { message_type, body } = event {
            tracing::info!(%message_type, %body, "message received");
        }
    });

    tracing::info!(signature = %BASE64.encode(peer.ring_signature()), "peer started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    peer.shutdown().await?;
    Ok(())
}

fn keygen(private_key_path: String, public_key_path: String) -> anyhow::Result<()> {
    let (private_key, public_key) = ringnet_crypto::asymmetric::generate_keypair()?;
    std::fs::write(&private_key_path, ringnet_crypto::asymmetric::private_key_to_pem(&private_key)?)?;
    std::fs::write(&public_key_path, ringnet_crypto::asymmetric::public_key_to_pem(&public_key)?)?;
    println!("private key: {private_key_path}");
    println!("public key:  {public_key_path}");
    Ok(())
}

fn ring_sign(ring_private_key_path: String, peer_public_key_path: String, out_path: String) -> anyhow::Result<()> {
    let ring_private_key =
        ringnet_crypto::asymmetric::private_key_from_pem(&std::fs::read_to_string(ring_private_key_path)?)?;
    let peer_public_key =
        ringnet_crypto::asymmetric::public_key_from_pem(&std::fs::read_to_string(peer_public_key_path)?)?;
    let signature = ringnet_crypto::identity::issue_ring_signature(&ring_private_key, &peer_public_key)?;
    std::fs::write(&out_path, BASE64.encode(signature))?;
    println!("signature written to {out_path}");
    Ok(())
}

/// Parse a `host:port[@base64-signature]` discovery seed.
fn parse_discovery_peer(raw: &str) -> DiscoveryAddress {
    match raw.split_once('@') {
        Some((address, signature)) => DiscoveryAddress {
            address: address.to_string(),
            signature: BASE64.decode(signature).ok(),
        },
        None => DiscoveryAddress::from(raw),
    }
}
