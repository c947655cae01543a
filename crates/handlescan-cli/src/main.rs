//! Handlescan - check where an account name is registered.
//!
//! ## Commands
//!
//! - `scan`: Probe every registry site for an account name
//! - `sites`: Show what the site registry contains
//! - `config`: Print the effective configuration

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use handlescan_core::{AccountName, AppConfig};
use handlescan_registry::{Registry, RegistryLoader};
use handlescan_scanner::{ScanSession, ScanSettings, SiteFilter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "handlescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find which sites an account name is registered on", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, env = "HANDLESCAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where to read the registry from, overriding the configuration.
#[derive(Debug, clap::Args)]
struct RegistryArgs {
    /// Registry document URL
    #[arg(long)]
    registry_url: Option<String>,

    /// Local registry document (takes precedence over the URL)
    #[arg(long)]
    registry_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Probe every registry site for an account name
    Scan {
        /// Account name to look for
        account: String,

        #[command(flatten)]
        registry: RegistryArgs,

        /// Per-probe timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum probes in flight (0 = unbounded)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Deadline for the whole scan in seconds
        #[arg(long)]
        deadline: Option<u64>,

        /// Only probe sites in this category
        #[arg(long, conflicts_with = "site")]
        category: Option<String>,

        /// Only probe these sites (repeatable)
        #[arg(long)]
        site: Vec<String>,

        /// Skip sites the registry flags as not valid
        #[arg(long)]
        valid_only: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// List sites where the account is missing
        #[arg(long)]
        show_absent: bool,
    },

    /// Show what the site registry contains
    Sites {
        #[command(flatten)]
        registry: RegistryArgs,

        /// List the sites of one category
        #[arg(long, conflicts_with = "site")]
        category: Option<String>,

        /// Show the full definition of one site
        #[arg(long)]
        site: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    config.logging.json |= cli.json_logs;
    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Scan {
            account,
            registry,
            timeout,
            concurrency,
            deadline,
            category,
            site,
            valid_only,
            json,
            show_absent,
        } => {
            registry.apply(&mut config);
            if let Some(secs) = timeout {
                config.scanning.probe_timeout_secs = secs;
            }
            if let Some(max) = concurrency {
                config.scanning.max_concurrent_probes = max;
            }
            if let Some(secs) = deadline {
                config.scanning.scan_deadline_secs = secs;
            }
            config.scanning.valid_only |= valid_only;
            config.validate().context("Invalid scan options")?;

            let filter = site_filter(category, site);
            cmd_scan(&config, &account, filter, json, show_absent).await
        }
        Commands::Sites {
            registry,
            category,
            site,
        } => {
            registry.apply(&mut config);
            cmd_sites(&config, category.as_deref(), site.as_deref()).await
        }
        Commands::Config => cmd_config(&config),
    }
}

impl RegistryArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.registry_url {
            config.registry.source_url.clone_from(url);
            config.registry.local_path = None;
        }
        if let Some(path) = &self.registry_file {
            config.registry.local_path = Some(path.clone());
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env();
            config.validate().context("Invalid configuration")?;
            config
        }
        None => AppConfig::load_with_env().context("Failed to load configuration")?,
    };
    Ok(config)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }
}

fn site_filter(category: Option<String>, sites: Vec<String>) -> SiteFilter {
    if !sites.is_empty() {
        SiteFilter::specific(sites)
    } else if let Some(category) = category {
        SiteFilter::category(category)
    } else {
        SiteFilter::all()
    }
}

async fn load_registry(config: &AppConfig) -> Result<Registry> {
    RegistryLoader::from_config(&config.registry)
        .load_registry()
        .await
        .context("Failed to load site registry")
}

async fn cmd_scan(
    config: &AppConfig,
    account: &str,
    filter: SiteFilter,
    json: bool,
    show_absent: bool,
) -> Result<()> {
    let account = AccountName::new(account).context("Invalid account name")?;
    let registry = Arc::new(load_registry(config).await?);

    let session = ScanSession::new(registry, account, ScanSettings::from(&config.scanning))
        .with_filter(filter);
    let report = session.run_with_client().await.context("Scan failed")?;

    info!(scan_id = %report.scan_id, "scan finished");

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print!("{}", output::render_report(&report, show_absent));
    }

    Ok(())
}

async fn cmd_sites(
    config: &AppConfig,
    category: Option<&str>,
    site: Option<&str>,
) -> Result<()> {
    let registry = load_registry(config).await?;

    match site {
        Some(name) => {
            let site = registry
                .get(name)
                .with_context(|| format!("No site named {name} in the registry"))?;
            print!("{}", output::render_site(&site));
        }
        None => print!("{}", output::render_sites(&registry, category)),
    }

    Ok(())
}

fn cmd_config(config: &AppConfig) -> Result<()> {
    print!(
        "{}",
        config.to_toml().context("Failed to serialize configuration")?
    );
    Ok(())
}
