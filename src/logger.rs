//! Log sink selection per environment
//!
//! - `local`: coloured human-readable output on stdout, `debug`
//! - `dev`: JSON lines appended to `dev.log`, `debug`
//! - `prod`: JSON lines appended to `prod.log`, `info`
//!
//! `RUST_LOG` overrides the level filter when set.

use std::{
    fs::{File, OpenOptions},
    sync::Arc,
};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Env;

/// Installs the subscriber for `env`.
pub fn init(env: Env) -> Result<()> {
    let installed = match env {
        Env::Local => tracing_subscriber::fmt()
            .with_env_filter(filter("debug"))
            .with_ansi(true)
            .try_init(),
        Env::Dev => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter("debug"))
            .with_writer(Arc::new(open_log("dev.log")?))
            .try_init(),
        Env::Prod => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter("info"))
            .with_writer(Arc::new(open_log("prod.log")?))
            .try_init(),
    };

    installed.map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("url_shortener={level},tower_http={level}")))
}

fn open_log(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {path}"))
}
