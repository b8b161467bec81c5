use anyhow::Result;
use clap::Parser;
use ee_inventory::config::ClientConfig;
use ee_inventory::earth_explorer::{Credentials, Dataset, EarthExplorer};
use ee_inventory::error::ApiError;
use ee_inventory::scene_search::{SceneSearch, DEFAULT_MAX_RESULTS};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Search the EarthExplorer inventory for Collection 1 scenes and write the
/// matching product ids to a text file
#[derive(Parser, Debug)]
#[command(name = "ee-inventory", version, about)]
struct Cli {
    /// Directory for the scene list text file, created if missing
    #[arg(short, long)]
    directory: PathBuf,

    /// ERS username
    #[arg(short, long, env = "EE_USERNAME")]
    username: Option<String>,

    /// ERS password, prompted for when omitted
    #[arg(long, env = "EE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// WRS2 path
    #[arg(long)]
    path: Option<u32>,

    /// WRS2 row
    #[arg(long)]
    row: Option<u32>,

    /// EE catalog dataset name
    #[arg(long, value_enum, default_value_t = Dataset::LandsatTmC1)]
    dataset: Dataset,

    /// Acquisition dates to search
    #[arg(long = "acq-dates", alias = "acq_dates", value_name = "YYYY-MM-DD,YYYY-MM-DD")]
    acq_dates: Option<String>,

    /// Months of acquisition to search for
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u32).range(1..=12)
    )]
    months: Vec<u32>,

    /// Maximum number of search results to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: u64,

    /// TOML file with client settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inventory API version
    #[arg(long)]
    api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::read(path)?,
            None => ClientConfig::default(),
        };
        if let Some(version) = &self.api_version {
            config.api_version = version.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.insecure {
            config.verify_tls = false;
        }
        Ok(config)
    }

    fn scene_search(&self) -> SceneSearch {
        SceneSearch {
            wrs_path: self.path,
            wrs_row: self.row,
            dataset: self.dataset,
            max_results: self.max_results,
            acq_dates: self.acq_dates.clone(),
            months: self.months.clone(),
            ..SceneSearch::new(&self.directory)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::from_options(cli.username.clone(), cli.password.clone())?;
    let config = cli.client_config()?;
    let api = EarthExplorer::from_config(&config)?;
    cli.scene_search().run(&api, &credentials).await?;
    Ok(())
}

/// Line written to stderr for a failed run. Remote errors are reported as
/// `{code}: {message}` without any prefix.
fn diagnostic(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(remote) if remote.is_remote() => remote.to_string(),
        _ => format!("Error: {err:#}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", diagnostic(&err));
            ExitCode::FAILURE
        }
    }
}
