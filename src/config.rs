//! Command line and environment configuration.
//!
//! Every flag can also be set through its `NOTEBOOKLM_*` variable; `.env` is
//! loaded before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::client::ClientConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine the home directory; set {0} explicitly")]
    NoHomeDir(&'static str),

    #[error("invalid API URL '{0}': expected an http:// or https:// address")]
    InvalidApiUrl(String),

    #[error("request timeout must be at least one second")]
    InvalidTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Report whether the stored NotebookLM session is present and usable.
    Status,
}

/// MCP server exposing Google NotebookLM to AI agents.
#[derive(Debug, Parser)]
#[command(name = "notebooklm-mcp", version, about)]
pub struct Cli {
    /// Transport to serve MCP over.
    #[arg(long, env = "NOTEBOOKLM_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    #[arg(long, env = "NOTEBOOKLM_HTTP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "NOTEBOOKLM_HTTP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Browser session file written by the login flow.
    /// [default: ~/.notebooklm/storage_state.json]
    #[arg(long, env = "NOTEBOOKLM_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Base URL of the NotebookLM bridge.
    #[arg(long, env = "NOTEBOOKLM_API_URL", default_value = "http://127.0.0.1:8765")]
    pub api_url: String,

    /// Where downloads land when no output path is given.
    /// [default: ~/notebooklm-downloads]
    #[arg(long, env = "NOTEBOOKLM_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "NOTEBOOKLM_REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout: u64,

    /// Origin allowed by CORS on the HTTP transport. Repeatable.
    #[arg(
        long = "allowed-origin",
        env = "NOTEBOOKLM_ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Resolved settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub storage_path: PathBuf,
    pub api_url: String,
    pub download_dir: PathBuf,
    pub request_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub command: Option<Command>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let api_url = cli.api_url.trim().to_string();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }
        if cli.request_timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let storage_path = match cli.storage_path {
            Some(path) => path,
            None => home_path("NOTEBOOKLM_STORAGE_PATH", &[".notebooklm", "storage_state.json"])?,
        };
        let download_dir = match cli.download_dir {
            Some(path) => path,
            None => home_path("NOTEBOOKLM_DOWNLOAD_DIR", &["notebooklm-downloads"])?,
        };

        Ok(Self {
            transport: cli.transport,
            host: cli.host,
            port: cli.port,
            storage_path,
            api_url,
            download_dir,
            request_timeout: Duration::from_secs(cli.request_timeout),
            allowed_origins: cli
                .allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            command: cli.command,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            storage_path: self.storage_path.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

fn home_path(variable: &'static str, parts: &[&str]) -> Result<PathBuf, ConfigError> {
    let mut path = dirs::home_dir().ok_or(ConfigError::NoHomeDir(variable))?;
    path.extend(parts);
    Ok(path)
}
