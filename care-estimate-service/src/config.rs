use anyhow::{Context, Result, bail};
use care_estimate::{DEFAULT_SESSION_TTL_SECS, EstimatorPolicy};
use std::path::PathBuf;
use tracing::info;

/// Thirty days
const MAX_SESSION_TTL_SECS: i64 = 30 * 24 * 3600;

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub port: u16,
    /// YAML file overriding the reference policy
    pub policy_path: Option<PathBuf>,
    /// Wizard sessions older than this are evicted
    pub session_ttl_secs: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            policy_path: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => defaults.port,
        };

        let session_ttl_secs = match lookup("WIZARD_SESSION_TTL_SECS") {
            Some(ttl) => {
                let secs = ttl.trim().parse::<i64>().with_context(|| {
                    format!("WIZARD_SESSION_TTL_SECS must be a number of seconds, got {ttl:?}")
                })?;
                if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
                    bail!("WIZARD_SESSION_TTL_SECS must be 1..={MAX_SESSION_TTL_SECS}, got {secs}");
                }
                secs
            }
            None => defaults.session_ttl_secs,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            policy_path: lookup("ESTIMATOR_POLICY")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            session_ttl_secs,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    pub fn load_policy(&self) -> Result<EstimatorPolicy> {
        match &self.policy_path {
            Some(path) => EstimatorPolicy::from_file(path)
                .with_context(|| format!("failed to load estimator policy {}", path.display())),
            None => {
                info!("Using reference estimator policy (set ESTIMATOR_POLICY to override)");
                Ok(EstimatorPolicy::default())
            }
        }
    }
}
