//! Server configuration.
//!
//! The listening port comes from the command line; everything else has a
//! default and can be overridden by an optional YAML file:
//!
//! ```yaml
//! root: /srv/files
//! max_connections: 256
//! max_header_len: 4096
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

/// Command line of the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "fileport", version)]
#[command(
    about = "Serves and creates files under the current directory, no URL encoding supported"
)]
pub struct Args {
    /// Port to listen on (all interfaces)
    #[arg(short, long, env = "FILEPORT_PORT")]
    pub port: u16,

    /// YAML file with server settings
    #[arg(short, long, env = "FILEPORT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Tunables of the event loop and the file mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory request paths are resolved against
    pub root: PathBuf,
    /// Size of the connection slot table
    pub max_connections: usize,
    /// Receive buffer size; request line and headers must fit
    pub max_header_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_connections: 512,
            max_header_len: 2048,
        }
    }
}

impl ServerConfig {
    /// Smallest receive buffer that still holds a minimal request line.
    pub const MIN_HEADER_LEN: usize = 64;

    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_yaml::from_str(source).context("invalid server configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&source).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be at least 1");
        }
        if self.max_header_len < Self::MIN_HEADER_LEN {
            anyhow::bail!(
                "max_header_len must be at least {}, got {}",
                Self::MIN_HEADER_LEN,
                self.max_header_len
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub server: ServerConfig,
}

impl Config {
    /// Reads the command line; invalid invocations print usage and exit.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let server = match &args.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        Ok(Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port)),
            server,
        })
    }

    /// Default settings listening on `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            server: ServerConfig::default(),
        }
    }
}
