use std::{fs::File, io::Read};

use camino::Utf8PathBuf;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::options::Args;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub system: System,
    pub store: Store,
    pub api: Api,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct System {
    pub bind_addr: String,
}

impl Default for System {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Store {
    /// Connection string handed to sea-orm, e.g. `sqlite://songy.sqlite?mode=rwc`.
    pub url: String,
    pub max_connections: Option<u32>,
    pub sqlx_logging: bool,
    pub sqlx_log_level: String,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            url: "sqlite://songy.sqlite?mode=rwc".to_string(),
            max_connections: None,
            sqlx_logging: true,
            sqlx_log_level: "debug".to_string(),
        }
    }
}

impl Store {
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            sqlx_logging: false,
            ..Default::default()
        }
    }

    pub fn sqlx_log_level(&self) -> log::LevelFilter {
        self.sqlx_log_level.parse().unwrap_or_else(|_| {
            warn!(
                "unknown sqlx log level {:?}, using debug",
                self.sqlx_log_level
            );
            log::LevelFilter::Debug
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Api {
    pub base_path: String,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_path: "/songs".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

const DEFAULT_CFG: &str = "songy.toml";

impl Config {
    /// Load `path`, or `songy.toml` if none is given. Only an explicitly
    /// requested file has to exist; otherwise built-in defaults are used.
    pub fn new(path: Option<Utf8PathBuf>) -> Result<Self, Error> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Utf8PathBuf::from(DEFAULT_CFG), false),
        };

        let mut fh = match File::open(&path) {
            Ok(fh) => fh,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                info!("no config file at {path}, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut data = String::new();
        fh.read_to_string(&mut data)?;

        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, Error> {
        Ok(toml::from_str(data)?)
    }

    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(address) = &args.address {
            self.system.bind_addr = address.clone();
        }
        if let Some(url) = &args.database_url {
            self.store.url = url.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.system.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.api.base_path, "/songs");
        assert!(config.store.url.starts_with("sqlite://"));
    }

    #[test]
    fn sections_override_independently() {
        let config = Config::parse(
            r#"
            [store]
            url = "sqlite::memory:"
            max_connections = 4
            sqlx_log_level = "trace"

            [api]
            base_path = "/api/songs"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.url, "sqlite::memory:");
        assert_eq!(config.store.max_connections, Some(4));
        assert_eq!(config.store.sqlx_log_level(), log::LevelFilter::Trace);
        assert_eq!(config.api.base_path, "/api/songs");
        assert_eq!(config.system.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn args_take_precedence() {
        let args = Args {
            config: None,
            address: Some("127.0.0.1:8080".into()),
            database_url: Some("sqlite://elsewhere.sqlite".into()),
        };
        let config = Config::default().with_args(&args);
        assert_eq!(config.system.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.store.url, "sqlite://elsewhere.sqlite");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = Utf8PathBuf::from("/nonexistent/songy.toml");
        assert!(matches!(Config::new(Some(missing)), Err(Error::Io(_))));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            Config::parse("[store]\nurl = 5"),
            Err(Error::Toml(_))
        ));
    }
}
