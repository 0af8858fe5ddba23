//! REStake CLI
//!
//! Inspect REStake networks: resolved chain profiles, gas schedules,
//! operators, validators and connectivity.

mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use restake_core::{GasTier, NetworkConfig};
use restake_directory::{CosmosDirectory, Directory, RestQueryClientFactory};
use restake_network::Network;
use settings::{load_networks, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "restake")]
#[command(version)]
#[command(about = "Inspect REStake networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Networks file, overrides the settings
    #[arg(short, long, global = true, env = "RESTAKE_NETWORKS")]
    networks: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured networks
    List {
        /// Estimate operator counts from the directory
        #[arg(long)]
        estimate: bool,
    },

    /// Show the resolved chain profile
    Profile {
        network: String,

        /// Skip the directory and resolve from local data only
        #[arg(long)]
        offline: bool,
    },

    /// Show the gas price schedule
    Gas {
        network: String,

        /// Skip the directory and resolve from local data only
        #[arg(long)]
        offline: bool,

        /// Estimated gas to turn into a gas limit
        #[arg(long)]
        estimate: Option<u64>,
    },

    /// List operators in display order
    Operators { network: String },

    /// List validators with their APY
    Validators {
        network: String,

        /// Only validators with this bond status
        #[arg(long)]
        status: Option<String>,
    },

    /// Connect to a network and report its status
    Connect {
        network: String,

        /// Connect timeout in milliseconds, overrides the settings
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Load and connect every enabled network
    Status,
}

fn init_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let text = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
    });
    let json = json.then(|| tracing_subscriber::fmt::layer().json());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json)
        .init();
}

struct App {
    settings: Settings,
    networks: Vec<NetworkConfig>,
}

impl App {
    fn find(&self, name: &str) -> anyhow::Result<NetworkConfig> {
        self.networks
            .iter()
            .find(|network| network.network_name() == name || network.name == name)
            .cloned()
            .with_context(|| format!("network {} is not configured", name))
    }

    fn directory(&self, config: &NetworkConfig) -> Arc<CosmosDirectory> {
        Arc::new(CosmosDirectory::new(
            self.settings.directory.directory_config(config.is_testnet()),
        ))
    }

    fn network(&self, config: NetworkConfig) -> anyhow::Result<Network> {
        let directory = self.directory(&config);
        let name = config.network_name().to_string();
        Network::new(config, directory, Arc::new(RestQueryClientFactory::new()))
            .with_context(|| format!("resolving {}", name))
    }

    async fn loaded(&self, name: &str) -> anyhow::Result<Network> {
        let network = self.network(self.find(name)?)?;
        network
            .load()
            .await
            .with_context(|| format!("loading {} from the directory", name))?;
        Ok(network)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(networks) = cli.networks {
        settings.networks_file = networks;
    }
    init_logging(cli.verbose, cli.log_json || settings.logging.json);

    let networks = load_networks(&settings.networks_path())?;
    tracing::debug!("Loaded {} networks from {:?}", networks.len(), settings.networks_file);
    let app = App { settings, networks };

    match cli.command {
        Commands::List { estimate } => {
            let addresses = if estimate {
                let directory = CosmosDirectory::new(app.settings.directory.directory_config(false));
                Some(directory.get_operator_addresses().await?)
            } else {
                None
            };

            for config in &app.networks {
                let name = config.network_name();
                let flags = [
                    (config.enabled == Some(false), "disabled"),
                    (config.experimental, "experimental"),
                    (config.is_testnet(), "testnet"),
                    (config.default, "default"),
                ]
                .iter()
                .filter(|(set, _)| *set)
                .map(|(_, flag)| *flag)
                .collect::<Vec<_>>()
                .join(", ");

                match &addresses {
                    Some(addresses) => {
                        let count = restake_network::estimate_operator_count(
                            config,
                            addresses.get(name),
                        );
                        println!("{:<24} {:>4} operators  {}", name, count, flags);
                    }
                    None => println!("{:<24} {}", name, flags),
                }
            }
        }

        Commands::Profile { network, offline } => {
            let network = if offline {
                app.network(app.find(&network)?)?
            } else {
                app.loaded(&network).await?
            };
            print_json(&network.profile())?;
        }

        Commands::Gas {
            network,
            offline,
            estimate,
        } => {
            let network = if offline {
                app.network(app.find(&network)?)?
            } else {
                app.loaded(&network).await?
            };
            let schedule = network.schedule();

            println!("Gas price: {}", schedule.gas_price());
            println!("  low:     {}", schedule.tier(GasTier::Low));
            println!("  average: {}", schedule.tier(GasTier::Average));
            println!("  high:    {}", schedule.tier(GasTier::High));
            println!("Gas modifier: {}", schedule.gas_modifier);
            if let Some(estimate) = estimate {
                println!("Gas limit for {}: {}", estimate, schedule.gas_limit(estimate));
            }
        }

        Commands::Operators { network } => {
            let network = app.loaded(&network).await?;
            let owner = network.snapshot().config.owner_address.clone();

            println!("{} operators on {}", network.operator_count(), network.name());
            for operator in network.get_operators() {
                let marker = if owner.as_deref() == Some(operator.address.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {:<52} {:<48} {}/day  {}",
                    marker,
                    operator.address,
                    operator.bot_address,
                    operator.runs_per_day(None),
                    operator.moniker.as_deref().unwrap_or("")
                );
            }
        }

        Commands::Validators { network, status } => {
            let network = app.loaded(&network).await?;
            let apy = network.get_apy();

            for (address, validator) in network.get_validators(status.as_deref()) {
                let apy = apy
                    .get(&address)
                    .map(|value| format!("{:.2}%", value * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<52} {:>8}  {:<24} {}",
                    address,
                    apy,
                    validator.status.as_deref().unwrap_or(""),
                    validator.moniker.as_deref().unwrap_or("")
                );
            }
        }

        Commands::Connect {
            network,
            timeout_ms,
        } => {
            let network = app.loaded(&network).await?;
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| app.settings.connect_timeout());

            let status = network.connect(Some(timeout)).await;

            println!("Network:   {}", network.name());
            println!("REST URL:  {}", network.rest_url().unwrap_or_default());
            println!("RPC URL:   {}", network.rpc_url());
            println!("Status:    {}", status);
            println!("Connected: {}", network.connected());
            println!("Online:    {}", network.online());
        }

        Commands::Status => {
            let timeout = app.settings.connect_timeout();
            let enabled: Vec<_> = app
                .networks
                .iter()
                .filter(|config| config.enabled != Some(false))
                .cloned()
                .collect();

            let checks = enabled.into_iter().map(|config| {
                let app = &app;
                async move {
                    let name = config.network_name().to_string();
                    let network = match app.network(config) {
                        Ok(network) => network,
                        Err(e) => return (name, format!("unusable: {:#}", e)),
                    };
                    if let Err(e) = network.load().await {
                        tracing::warn!("Failed to load {}: {}", name, e);
                    }
                    let status = network.connect(Some(timeout)).await;
                    (name, status.to_string())
                }
            });

            for (name, status) in join_all(checks).await {
                println!("{:<24} {}", name, status);
            }
        }
    }

    Ok(())
}
