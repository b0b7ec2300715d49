//! Issue-key command - issues a key against the configured key store

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::api_key::redact_key;
use crate::infrastructure::logging::init_logging;

#[derive(Debug, Args)]
pub struct IssueKeyArgs {
    /// Principal id the key belongs to
    #[arg(long)]
    pub owner: String,

    /// Lifetime in days; defaults to `api_keys.default_ttl_days`
    #[arg(long)]
    pub ttl_days: Option<u32>,
}

/// Issue a key and print it to stdout
pub async fn run(args: IssueKeyArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let state = crate::create_app_state_with_config(&config).await?;
    let key = state.api_keys.issue(&args.owner, args.ttl_days).await?;

    info!(owner_id = %args.owner, key = %redact_key(&key), "Issued API key from CLI");
    println!("{}", key);

    Ok(())
}
