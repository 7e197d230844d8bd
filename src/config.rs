//! Application configuration loaded from environment variables.
//!
//! `main` loads a `.env` file (if present) with `dotenvy` before calling
//! [`load_from_env`], so variables can come from either place.
//!
//! ## Variables
//!
//! - `ENV` - `local`, `dev` or `prod` (default: `local`)
//! - `STORAGE_PATH` - redb database file (default: `storage.db`)
//! - `HTTP_ADDRESS` - bind address (default: `localhost:8080`)
//! - `HTTP_TIMEOUT` - per-request timeout in seconds (default: `4`); also
//!   bounds how long a connection may take to send request headers
//! - `HTTP_IDLE_TIMEOUT` - seconds a keep-alive connection may sit idle
//!   before it is closed (default: `60`)
//! - `HTTP_USER` / `HTTP_PASSWORD` - basic-auth credentials for `/url` (required)

use std::{env, fmt, str::FromStr, time::Duration};

use anyhow::{Context, Result};

use crate::middleware::Credentials;

/// Deployment environment, selects the log sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Local,
    Dev,
    Prod,
}

impl FromStr for Env {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "prod" => Ok(Env::Prod),
            other => anyhow::bail!("unknown env: {other:?} (expected local, dev or prod)"),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Env::Local => "local",
            Env::Dev => "dev",
            Env::Prod => "prod",
        })
    }
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct HttpServer {
    pub address: String,
    pub timeout: Duration,
    pub idle_timeout: Duration,
    pub credentials: Credentials,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub env: Env,
    pub storage_path: String,
    pub http_server: HttpServer,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = lookup("ENV")
            .unwrap_or_else(|| "local".to_string())
            .parse::<Env>()
            .context("invalid ENV")?;

        let storage_path = lookup("STORAGE_PATH").unwrap_or_else(|| "storage.db".to_string());
        let address = lookup("HTTP_ADDRESS").unwrap_or_else(|| "localhost:8080".to_string());

        let timeout = seconds(&lookup, "HTTP_TIMEOUT", 4)?;
        let idle_timeout = seconds(&lookup, "HTTP_IDLE_TIMEOUT", 60)?;

        let user = lookup("HTTP_USER").context("HTTP_USER must be set")?;
        let password = lookup("HTTP_PASSWORD").context("HTTP_PASSWORD must be set")?;

        Ok(Self {
            env,
            storage_path,
            http_server: HttpServer {
                address,
                timeout,
                idle_timeout,
                credentials: Credentials { user, password },
            },
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `storage_path` is empty
    /// - `address` is not in `host:port` form
    /// - `timeout` or `idle_timeout` is zero
    /// - the basic-auth user or password is empty
    pub fn validate(&self) -> Result<()> {
        if self.storage_path.is_empty() {
            anyhow::bail!("STORAGE_PATH must not be empty");
        }

        if !self.http_server.address.contains(':') {
            anyhow::bail!(
                "HTTP_ADDRESS must be in format 'host:port', got '{}'",
                self.http_server.address
            );
        }

        if self.http_server.timeout.is_zero() {
            anyhow::bail!("HTTP_TIMEOUT must be greater than 0");
        }

        if self.http_server.idle_timeout.is_zero() {
            anyhow::bail!("HTTP_IDLE_TIMEOUT must be greater than 0");
        }

        if self.http_server.credentials.user.is_empty() {
            anyhow::bail!("HTTP_USER must not be empty");
        }
        if self.http_server.credentials.password.is_empty() {
            anyhow::bail!("HTTP_PASSWORD must not be empty");
        }

        Ok(())
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a number of seconds, got {raw:?}"))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

/// Loads and validates configuration from environment variables.
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
