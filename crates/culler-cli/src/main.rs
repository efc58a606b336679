//! culler — randomly terminates instances during work hours.
//!
//! # Usage
//!
//! ```text
//! culler --config /etc/culler/culler.toml schedule
//! culler fetch-schedule
//! culler terminate foo prod --region=us-east-1 --cluster=foo-prod
//! culler eligible foo prod --stack=staging
//! culler regions foo-prod prod
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use culler_core::{CullerConfig, LogErrorCounter, StaticDeployment};
use culler_term::Target;
use tracing_subscriber::EnvFilter;

mod commands;
mod cron;
mod store;
mod terminator;

#[derive(Parser)]
#[command(
    name = "culler",
    about = "Culler: random instance termination during work hours",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, global = true, default_value = "/etc/culler/culler.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate today's schedule, publish it and install it with cron
    Schedule {
        /// Only consider these services (default: every known service)
        #[arg(long = "service")]
        services: Vec<String>,
    },
    /// Install the schedule published earlier today, if any
    FetchSchedule,
    /// Terminate one random eligible instance of a group
    Terminate(GroupArgs),
    /// Print the ids of the instances eligible for termination
    Eligible(GroupArgs),
    /// Print the regions a cluster is deployed in
    Regions {
        cluster: String,
        account: String,
    },
}

#[derive(Args)]
struct GroupArgs {
    service: String,
    account: String,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    stack: Option<String>,
    #[arg(long)]
    cluster: Option<String>,
}

impl From<GroupArgs> for Target {
    fn from(args: GroupArgs) -> Self {
        Target {
            service: args.service,
            account: args.account,
            region: args.region,
            stack: args.stack,
            cluster: args.cluster,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = CullerConfig::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Schedule { services } => {
            let store = store::open_with_retry(&config.store_path)?;
            commands::schedule::run(
                &config,
                &topology(&config)?,
                &store,
                &services,
                chrono::Utc::now(),
                &mut rand::thread_rng(),
                &mut stdout,
            )?;
        }
        Commands::FetchSchedule => {
            let store = store::open_with_retry(&config.store_path)?;
            commands::fetch_schedule::run(&config, &store, chrono::Utc::now(), &mut stdout)?;
        }
        Commands::Terminate(args) => {
            commands::terminate::run(
                &config,
                Arc::new(topology(&config)?),
                Arc::new(store::FileGate::new(&config.store_path)),
                &args.into(),
                &LogErrorCounter,
            )?;
        }
        Commands::Eligible(args) => {
            commands::eligible::run(&config, &topology(&config)?, &args.into(), &mut stdout)?;
        }
        Commands::Regions { cluster, account } => {
            commands::regions::run(&topology(&config)?, &cluster, &account, &mut stdout)?;
        }
    }
    Ok(())
}

fn topology(config: &CullerConfig) -> anyhow::Result<StaticDeployment> {
    StaticDeployment::from_file(&config.topology_path)
        .with_context(|| format!("loading topology from {}", config.topology_path.display()))
}

/// `RUST_LOG` wins; otherwise `info,culler=debug`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,culler=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
