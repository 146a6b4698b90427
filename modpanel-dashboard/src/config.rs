use std::time::Duration;

use serde::Deserialize;

use modpanel_shared::errors::AppResult;

use crate::actions::{DerivationPolicy, ScanPolicy};

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub default_reason: String,
    #[serde(default = "default_context_server_scan")]
    pub context_server_scan: String,
}

fn default_api_base_url() -> String { "http://localhost:8000".into() }
fn default_timeout() -> u64 { 10 }
fn default_context_server_scan() -> String { "last".into() }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: String::new(),
            request_timeout_secs: default_timeout(),
            default_reason: String::new(),
            context_server_scan: default_context_server_scan(),
        }
    }
}

impl DashboardConfig {
    /// Reads `MODPANEL__*` variables, after loading `.env` if there is one.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MODPANEL").separator("__"))
            .build()?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: config::Config) -> Self {
        config.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid dashboard config, using defaults");
            Self::default()
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn derivation_policy(&self) -> AppResult<DerivationPolicy> {
        Ok(DerivationPolicy {
            context_server: self.context_server_scan.parse::<ScanPolicy>()?,
            ..DerivationPolicy::default()
        })
    }
}
