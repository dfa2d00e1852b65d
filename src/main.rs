use anyhow::Result;
use resultfetch::{
    client::{Config, ResultsClient},
    fetch,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) resolve configuration once ───────────────────────────────
    let config = Config::from_env();
    info!(api_root = %config.api_root, "configured");
    let client = ResultsClient::new(&config)?;

    // ─── 3) fetch the index ──────────────────────────────────────────
    let index = fetch::fetch_index(&client).await?;
    info!("{} result files listed", index.len());

    // ─── 4) fetch and decode each file ───────────────────────────────
    for name in &index {
        match fetch::fetch_results(&client, name).await? {
            Some(rows) => info!(file = %name, rows = rows.len(), "decoded"),
            None => warn!(file = %name, "decode failed; diagnostics logged above"),
        }
    }

    info!("all done");
    Ok(())
}
