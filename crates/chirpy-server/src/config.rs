use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Server settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let port = var("CHIRPY_PORT", "8080");
        let port: u16 = port
            .parse()
            .with_context(|| format!("CHIRPY_PORT is not a valid port: {port}"))?;

        Ok(Self {
            jwt_secret: var("CHIRPY_JWT_SECRET", "dev-secret-change-me"),
            polka_key: var("CHIRPY_POLKA_KEY", ""),
            db_path: PathBuf::from(var("CHIRPY_DB_PATH", "database.json")),
            static_dir: PathBuf::from(var("CHIRPY_STATIC_DIR", ".")),
            host: var("CHIRPY_HOST", "localhost"),
            port,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        std::net::ToSocketAddrs::to_socket_addrs(&addr)
            .with_context(|| format!("cannot resolve {addr}"))?
            .next()
            .with_context(|| format!("no address for {addr}"))
    }
}
