use camino::Utf8PathBuf;
use clap::Parser;

/// Song catalog REST service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (defaults to `songy.toml` if present)
    #[arg(short, long, env = "SONGY_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Address to listen on, overrides `system.bind_addr`
    #[arg(short, long, env = "SONGY_ADDRESS")]
    pub address: Option<String>,

    /// Database connection string, overrides `store.url`
    #[arg(short, long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}
