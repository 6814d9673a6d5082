//! Tracing setup for the sidecar.
//!
//! stdout carries the JSON protocol, so every log line goes to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

const LOG_ENV: &str = "IQACD_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn init() -> Result<(), LoggingError> {
    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr);
    let subscriber = Registry::default().with(build_env_filter()).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
