//! usersplit: fetch random users, split them into MySQL tables and export
//! two JSON datasets built from those tables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use usersplit_core::config::{
    load_dotenv, DatabaseSettings, OutputConfig, SourceConfig, DEFAULT_API_URL, DEFAULT_RESULTS,
    DEFAULT_TABLE_PREFIX,
};
use usersplit_core::Config;
use usersplit_pipeline::Pipeline;

// ── CLI ─────────────────────────────────────────────────────────────

/// Random-user ETL: partition by gender and age decade, then export.
#[derive(Parser, Debug)]
#[command(name = "usersplit", version, about)]
struct Cli {
    /// Settings file with the `user`, `password`, `host` and `database` keys.
    #[arg(long, env = "USERSPLIT_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Random user API endpoint.
    #[arg(long, env = "USERSPLIT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Number of users to request.
    #[arg(long, env = "USERSPLIT_RESULTS", default_value_t = DEFAULT_RESULTS)]
    results: usize,

    /// HTTP timeout in seconds; unset waits indefinitely.
    #[arg(long, env = "USERSPLIT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Prefix shared by every table written.
    #[arg(long, env = "USERSPLIT_TABLE_PREFIX", default_value = DEFAULT_TABLE_PREFIX)]
    table_prefix: String,

    /// Most recent registrations kept per gender in the top table.
    #[arg(long, env = "USERSPLIT_TOP_N", default_value_t = 20)]
    top_n: usize,

    /// Directory receiving first.json and second.json.
    #[arg(long, env = "USERSPLIT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Full sqlx URL; replaces the credentials from the settings file.
    #[arg(long, env = "USERSPLIT_DATABASE_URL")]
    database_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let database = match self.database_url {
            Some(url) => DatabaseSettings::Url(url),
            None => DatabaseSettings::from_env().with_context(|| {
                format!("reading database settings ({})", self.env_file.display())
            })?,
        };

        Ok(Config {
            database,
            source: SourceConfig {
                api_url: self.api_url,
                results: self.results,
                timeout: self.timeout_secs.map(Duration::from_secs),
            },
            output: OutputConfig {
                table_prefix: self.table_prefix,
                output_dir: self.output_dir,
                top_n: self.top_n,
            },
        })
    }
}

// ── Entry point ─────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    load_dotenv(&cli.env_file);

    let config = cli.into_config()?;
    config.log_summary();

    let pipeline = Pipeline::with_api(config).context("building pipeline")?;
    let report = pipeline.run().await.context("usersplit run failed")?;

    info!(elapsed_ms = report.elapsed_ms, "Done");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
