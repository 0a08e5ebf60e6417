//! Gateway config loader (strict parsing).
//!
//! The process environment is consulted here, once, at startup. The admission
//! path only ever sees the resolved `Environment` value.

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use gatehouse_core::error::{Result, GatehouseError};
use gatehouse_core::Environment;

pub use schema::{
    AdmissionSection, BotCategory, EnforcementMode, GatewayConfig, LocalEvaluatorConfig,
    QuotaConfig, QuotaSection,
};

/// Variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "GATEHOUSE_CONFIG";
/// Environment signals, most specific first.
pub const ENVIRONMENT_VARS: [&str; 2] = ["GATEHOUSE_ENV", "APP_ENV"];

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GatehouseError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like `load_from_file`, but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(GatewayConfig::default())
        }
        Err(e) => Err(GatehouseError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GatehouseError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Override `gateway.environment` from environment signals, if any is set.
pub fn apply_environment_override(cfg: &mut GatewayConfig, signals: &[Option<String>]) {
    if let Some(env) = Environment::from_signals(signals.iter().map(|s| s.as_deref())) {
        cfg.gateway.environment = env;
    }
}

/// Read the environment signals from the process.
pub fn environment_signals() -> Vec<Option<String>> {
    ENVIRONMENT_VARS
        .iter()
        .map(|k| std::env::var(k).ok())
        .collect()
}
