// Daemon configuration, read once from the environment

use anyhow::{anyhow, Result};
use extracta_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use extracta_core::application::constants::{
    DEFAULT_ENRICH_CONCURRENCY, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_RUN_TIMEOUT,
    DEFAULT_SETTLE_DELAY,
};
use extracta_core::application::OrchestratorConfig;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    /// Daily-rolling log files go here when set
    pub log_dir: Option<String>,
    pub orchestrator: OrchestratorConfig,
    pub persist_url: Option<String>,
    pub persist_timeout: Duration,
    pub user_agent: Option<String>,
    pub cancel_on_disconnect: bool,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_format = match var("EXTRACTA_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let orchestrator = OrchestratorConfig {
            run_timeout: millis(&var, "EXTRACTA_RUN_TIMEOUT_MS", DEFAULT_RUN_TIMEOUT)?,
            navigation_timeout: millis(&var, "EXTRACTA_NAV_TIMEOUT_MS", DEFAULT_NAVIGATION_TIMEOUT)?,
            settle_delay: millis(&var, "EXTRACTA_SETTLE_MS", DEFAULT_SETTLE_DELAY)?,
            enrich_concurrency: parsed(&var, "EXTRACTA_ENRICH_CONCURRENCY", DEFAULT_ENRICH_CONCURRENCY)?
                .max(1),
        };

        Ok(Self {
            rpc_host: var("EXTRACTA_RPC_HOST").unwrap_or_else(|| DEFAULT_RPC_HOST.to_string()),
            rpc_port: parsed(&var, "EXTRACTA_RPC_PORT", DEFAULT_RPC_PORT)?,
            log_format,
            log_dir: var("EXTRACTA_LOG_DIR").map(|dir| shellexpand::tilde(&dir).into_owned()),
            orchestrator,
            persist_url: var("EXTRACTA_PERSIST_URL"),
            persist_timeout: millis(&var, "EXTRACTA_PERSIST_TIMEOUT_MS", DEFAULT_PERSIST_TIMEOUT)?,
            user_agent: var("EXTRACTA_USER_AGENT"),
            cancel_on_disconnect: parsed(&var, "EXTRACTA_STREAM_CANCEL_ON_DISCONNECT", false)?,
        })
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn millis(var: &impl Fn(&str) -> Option<String>, key: &str, default: Duration) -> Result<Duration> {
    let default_ms = default.as_millis() as u64;
    parsed(var, key, default_ms).map(Duration::from_millis)
}
