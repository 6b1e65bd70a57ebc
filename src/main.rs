//! VPN Guard CLI.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vpn_guard::classifier::proxycheck::ProxyCheckClient;
use vpn_guard::Config;

#[derive(Parser, Debug)]
#[command(name = "vpn-guard")]
#[command(about = "VPN guard for multiplayer servers - classify addresses as VPN/proxy or clean")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "vpn-guard.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Addresses to classify
    #[arg(value_name = "ADDRESS")]
    addresses: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let config = Config::load(&args.config)?;

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    if args.addresses.is_empty() {
        anyhow::bail!("No addresses given; pass one or more addresses to classify");
    }

    let client = ProxyCheckClient::new(config.proxycheck.clone())?;

    // Unlike the guard, report lookup failures instead of failing open.
    for address in &args.addresses {
        if address.is_empty() {
            println!("(empty): address unavailable");
            continue;
        }
        match client.lookup(address).await {
            Ok(verdict) => println!("{}: {}", address, verdict),
            Err(e) => println!("{}: unknown ({})", address, e),
        }
    }

    Ok(())
}
