//! LAN setup - points shop-floor machines at the inventory server
//!
//! Detects this machine's LAN address, checks the server port answers on it
//! and writes a hosts-file entry for the configured hostname.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use inventory_server::services::network::{detect_lan_ip, is_reachable, rewrite_hosts, update_hosts_file};
use inventory_server::config::{Config, LanConfig};

#[derive(Parser)]
#[command(name = "lan-setup")]
#[command(about = "Configure LAN access to the inventory server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected LAN address
    Detect,

    /// Check that the server port answers
    Check {
        /// Server address; defaults to the detected LAN address
        #[arg(long)]
        ip: Option<IpAddr>,

        /// Server port; defaults to the configured LAN port
        #[arg(short, long)]
        port: Option<u16>,

        /// Timeout in seconds
        #[arg(long, default_value_t = 2)]
        timeout: u64,
    },

    /// Map the hostname to the server address in the hosts file
    Apply {
        /// Hostname to map; defaults to the configured one
        hostname: Option<String>,

        /// Override the detected LAN address
        #[arg(long)]
        ip: Option<IpAddr>,

        /// Hosts file to rewrite; defaults to the configured one
        #[arg(long)]
        hosts_file: Option<PathBuf>,

        /// Print the resulting file instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_server=info,lan_setup=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let lan = match Config::load() {
        Ok(config) => config.lan,
        Err(e) => {
            tracing::warn!(error = %e, "Configuration incomplete, using LAN defaults");
            LanConfig::default()
        }
    };

    match cli.command {
        Commands::Detect => {
            let ip = lan_ip(None)?;
            println!("{ip}");
        }
        Commands::Check { ip, port, timeout } => {
            let ip = lan_ip(ip)?;
            let port = port.unwrap_or(lan.port);
            if is_reachable(ip, port, Duration::from_secs(timeout)).await {
                println!("{ip}:{port} is reachable");
            } else {
                anyhow::bail!("{ip}:{port} did not answer within {timeout}s");
            }
        }
        Commands::Apply {
            hostname,
            ip,
            hosts_file,
            dry_run,
        } => {
            let hostname = hostname.unwrap_or_else(|| lan.hostname.clone());
            let ip = lan_ip(ip)?;
            let path = hosts_file.unwrap_or_else(|| PathBuf::from(&lan.hosts_file));

            if dry_run {
                let current = std::fs::read_to_string(&path).unwrap_or_default();
                print!("{}", rewrite_hosts(&current, &hostname, ip));
                return Ok(());
            }

            let changed = update_hosts_file(&path, &hostname, ip)
                .with_context(|| format!("updating {} (administrator rights may be required)", path.display()))?;
            if changed {
                println!("Mapped {hostname} to {ip} in {}", path.display());
            } else {
                println!("{} already maps {hostname} to {ip}", path.display());
            }
        }
    }

    Ok(())
}

fn lan_ip(explicit: Option<IpAddr>) -> anyhow::Result<IpAddr> {
    explicit
        .or_else(detect_lan_ip)
        .context("unable to detect the LAN address; pass --ip to set it")
}
