//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Chain identifier every transaction must carry
    pub chain_id: String,

    /// Identities authorized to propose blocks
    pub validators: Vec<String>,

    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,
}

fn default_service_name() -> String {
    "akin-ledger".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            chain_id: "AKIN:CHAIN:DEMO".to_string(),
            validators: vec!["AKIN:VALIDATOR:1".to_string()],
            actor: ActorConfig::default(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Bounded mailbox capacity (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(chain_id) = std::env::var("AKIN_CHAIN_ID") {
            config.chain_id = chain_id;
        }

        if let Ok(validators) = std::env::var("AKIN_VALIDATORS") {
            config.validators = parse_validators(&validators);
        }

        if let Ok(capacity) = std::env::var("AKIN_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid AKIN_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the ledger relies on
    pub fn validate(&self) -> crate::Result<()> {
        if self.chain_id.trim().is_empty() {
            return Err(crate::Error::Config("chain_id must not be empty".to_string()));
        }
        if self.validators.is_empty() {
            return Err(crate::Error::Config(
                "at least one validator is required".to_string(),
            ));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated validator list
fn parse_validators(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
