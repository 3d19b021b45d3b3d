//! CLI entry point for lanwatch.
//!
//! Scan and list local network hosts. One of its uses is spotting recently
//! connected devices: every run is diffed against the previous run's host
//! list. Retrieving MAC addresses requires elevated privileges.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use lanwatch_core::{ReconcileReport, Settings, SettingsError, SettingsStore};

use lanwatch_discover::reconcile::Reconciler;
use lanwatch_discover::render::{alias_table, config_table, host_table, render};
use lanwatch_discover::scanner::NmapScanner;

#[derive(Parser)]
#[command(name = "lanwatch")]
#[command(about = "Scan and list local network hosts", version)]
struct Cli {
    /// Settings file (scan defaults, aliases, last-run baseline).
    #[arg(long, global = true, default_value = "lanwatch.toml")]
    settings: PathBuf,

    /// Path to the nmap binary.
    #[arg(long, global = true, default_value = "nmap")]
    nmap_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List local network hosts.
    Hosts {
        /// Number of discovery passes (default from settings, normally 3).
        passes: Option<u32>,
        /// Base address of the /24 to sweep (default from settings).
        prefix: Option<String>,
    },
    /// Application configuration commands.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// MAC address alias commands.
    #[command(subcommand)]
    Alias(AliasCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// List application settings.
    List,
    /// Change the number of discovery passes per run.
    SetAttempts { attempts: u32 },
    /// Change the base address for network discovery.
    SetPrefix { base_ip: String },
}

#[derive(Subcommand)]
enum AliasCommand {
    /// List host aliases with their indices.
    List,
    /// Add or replace a MAC address alias.
    Add { mac: String, label: String },
    /// Remove an alias by its index in `alias list`.
    Remove { index: usize },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let store = SettingsStore::new(&cli.settings);

    match &cli.command {
        Command::Hosts { passes, prefix } => {
            run_hosts(&cli, &store, *passes, prefix.as_deref()).await
        }
        Command::Config(cmd) => run_config(&store, cmd),
        Command::Alias(cmd) => run_alias(&store, cmd),
    }
}

async fn run_hosts(
    cli: &Cli,
    store: &SettingsStore,
    passes: Option<u32>,
    prefix: Option<&str>,
) -> anyhow::Result<()> {
    let scanner = NmapScanner::new(&cli.nmap_path);
    let version = scanner.verify_installation().await?;
    tracing::debug!(nmap_version = %version.trim(), "Nmap verified");

    let report = Reconciler::new(&scanner, store).run(prefix, passes).await?;

    if report.is_empty() {
        println!("No hosts found");
        return Ok(());
    }

    let settings = store.load()?;
    print_report(&report, &settings);
    Ok(())
}

fn print_report(report: &ReconcileReport, settings: &Settings) {
    println!("Scan timestamp: {} UTC", Utc::now().format("%Y-%m-%d %H:%M"));
    println!("\nNumber of hosts found: {}\n", report.hosts.len());
    println!("{}", render(&host_table(&report.hosts, settings)));

    println!("New hosts since last scan:");
    for addr in sorted_addresses(&report.new_addresses) {
        println!("{addr}");
    }

    println!("\nRemoved hosts since last scan:");
    for addr in sorted_addresses(&report.removed_addresses) {
        println!("{addr}");
    }
}

/// The diff sets carry no order; sort them for display the same way the
/// host table is sorted.
fn sorted_addresses(set: &std::collections::HashSet<String>) -> Vec<&String> {
    let mut addrs: Vec<&String> = set.iter().collect();
    addrs.sort_by_key(|a| {
        a.rsplit('.')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(u32::MAX)
    });
    addrs
}

fn run_config(store: &SettingsStore, cmd: &ConfigCommand) -> anyhow::Result<()> {
    let settings = match cmd {
        ConfigCommand::List => store.load()?,
        ConfigCommand::SetAttempts { attempts } => match store.set_attempts(*attempts) {
            Ok(s) => s,
            Err(SettingsError::InvalidAttempts(_)) => {
                println!("Number of attempts must be at least 1");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
        ConfigCommand::SetPrefix { base_ip } => store.set_base_ip(base_ip)?,
    };

    println!("{}", render(&config_table(&settings)));
    Ok(())
}

fn run_alias(store: &SettingsStore, cmd: &AliasCommand) -> anyhow::Result<()> {
    let settings = match cmd {
        AliasCommand::List => store.load()?,
        AliasCommand::Add { mac, label } => store.add_alias(mac, label)?,
        AliasCommand::Remove { index } => match store.remove_alias(*index) {
            Ok(s) => s,
            Err(SettingsError::AliasIndex(_)) => {
                println!("Incorrect index. No element was deleted.");
                store.load()?
            }
            Err(e) => return Err(e.into()),
        },
    };

    println!("{}", render(&alias_table(&settings)));
    Ok(())
}
