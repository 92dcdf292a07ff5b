use std::sync::Arc;

use clap::Parser;
use songy::{api::serve, config::Config, db::DB, options};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = options::Args::parse();
    debug!("{args:?}");

    let config = Config::new(args.config.clone())?.with_args(&args);
    let db = DB::connect(&config.store).await?;

    serve(Arc::new(db), &config).await?;
    Ok(())
}
