use std::{path::Path, time::Duration};

use anyhow::{anyhow, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

use scriptlog_common::{
    config::{
        BUILDNET_RPC_ADDRESS, DEFAULT_CONTRACT_ADDRESS, DEFAULT_FINALIZATION_TIMEOUT_SECS,
        DEFAULT_POLL_INTERVAL_MS, DEFAULT_WALLET_ADDRESS, LOCAL_RPC_ADDRESS, MAINNET_RPC_ADDRESS,
        PREFIX_CONTRACT_ADDRESS, SAVE_SCRIPT_FEE, SAVE_SCRIPT_MAX_GAS,
    },
    logger::LogConfig,
};

use crate::{
    script_client::ClientSettings,
    transport::{parse_endpoint, TransportConfig},
};

/// Default values for configuration
pub mod defaults {
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    // Validation limits
    pub const MIN_TIMEOUT_SECS: u64 = 1;
    pub const MAX_TIMEOUT_SECS: u64 = 300;
    pub const MAX_FINALIZATION_TIMEOUT_SECS: u64 = 3600;
    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
    pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[derive(clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Buildnet,
    Local,
}

impl Network {
    pub fn rpc_address(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_RPC_ADDRESS,
            Self::Buildnet => BUILDNET_RPC_ADDRESS,
            Self::Local => LOCAL_RPC_ADDRESS,
        }
    }
}

fn default_wallet_address() -> String {
    DEFAULT_WALLET_ADDRESS.to_owned()
}
fn default_contract_address() -> String {
    DEFAULT_CONTRACT_ADDRESS.to_owned()
}
fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}
fn default_connection_timeout_secs() -> u64 {
    defaults::CONNECTION_TIMEOUT_SECS
}
fn default_finalization_timeout_secs() -> u64 {
    DEFAULT_FINALIZATION_TIMEOUT_SECS
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_max_gas() -> u64 {
    SAVE_SCRIPT_MAX_GAS
}
fn default_fee() -> u64 {
    SAVE_SCRIPT_FEE
}

/// Client configuration, loaded from the command line or a JSON file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatedConfig {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub network: Network,

    /// Node JSON-RPC address, the network endpoint when absent
    #[serde(default)]
    pub node_address: Option<String>,

    #[serde(default = "default_wallet_address")]
    pub wallet_address: String,

    #[serde(default = "default_contract_address")]
    pub contract_address: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    #[serde(default = "default_finalization_timeout_secs")]
    pub finalization_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Read final datastore values instead of candidate ones
    #[serde(default)]
    pub final_reads: bool,

    #[serde(default = "default_max_gas")]
    pub max_gas: u64,

    #[serde(default = "default_fee")]
    pub fee: u64,

    #[serde(default)]
    pub auto_fix_config: bool,

    #[serde(default)]
    pub strict_validation: bool,
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            network: Network::default(),
            node_address: None,
            wallet_address: default_wallet_address(),
            contract_address: default_contract_address(),
            request_timeout_secs: default_request_timeout_secs(),
            connection_timeout_secs: default_connection_timeout_secs(),
            finalization_timeout_secs: default_finalization_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            final_reads: false,
            max_gas: default_max_gas(),
            fee: default_fee(),
            auto_fix_config: true,
            strict_validation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("Invalid {field} address: '{address}' - must be a valid HTTP/HTTPS URL")]
    InvalidEndpoint { field: &'static str, address: String },
    #[error("Invalid contract address: '{0}' - must start with '{prefix}'", prefix = PREFIX_CONTRACT_ADDRESS)]
    InvalidContractAddress(String),
    #[error("Invalid {field}: {value} - must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

pub type ValidationResult<T> = std::result::Result<T, ConfigValidationError>;

pub struct ConfigValidator {
    strict_mode: bool,
    auto_fix: bool,
}

impl ConfigValidator {
    pub fn new(strict_mode: bool, auto_fix: bool) -> Self {
        Self {
            strict_mode,
            auto_fix,
        }
    }

    fn can_fix(&self) -> bool {
        self.auto_fix && !self.strict_mode
    }

    // Replace an invalid value by its default, or fail
    fn fix<T: std::fmt::Display>(
        &self,
        error: ConfigValidationError,
        value: &mut T,
        default: T,
        fixed_issues: &mut Vec<String>,
    ) -> Result<()> {
        if !self.can_fix() {
            return Err(anyhow!("Configuration validation failed: {}", error));
        }

        if log::log_enabled!(log::Level::Warn) {
            warn!("Auto-fixing configuration: {}", error);
        }
        *value = default;
        fixed_issues.push(format!("{} (now {})", error, value));
        Ok(())
    }

    /// Validate the configuration, fixing what can be fixed.
    /// Returns the list of applied fixes.
    pub fn validate(&self, config: &mut ValidatedConfig) -> Result<Vec<String>> {
        let mut fixed_issues = Vec::new();

        if let Some(address) = config.node_address.as_deref() {
            if let Err(e) = Self::validate_endpoint("node", address) {
                if !self.can_fix() {
                    return Err(anyhow!("Configuration validation failed: {}", e));
                }
                warn!("Auto-fixing configuration: {}", e);
                config.node_address = None;
                fixed_issues.push(format!("{} (now {})", e, config.network.rpc_address()));
            }
        }

        if let Err(e) = Self::validate_endpoint("wallet", &config.wallet_address) {
            self.fix(e, &mut config.wallet_address, default_wallet_address(), &mut fixed_issues)?;
        }

        if let Err(e) = Self::validate_contract_address(&config.contract_address) {
            self.fix(e, &mut config.contract_address, default_contract_address(), &mut fixed_issues)?;
        }

        let ranges = [
            (
                "request_timeout_secs",
                &mut config.request_timeout_secs,
                defaults::MIN_TIMEOUT_SECS,
                defaults::MAX_TIMEOUT_SECS,
                defaults::REQUEST_TIMEOUT_SECS,
            ),
            (
                "connection_timeout_secs",
                &mut config.connection_timeout_secs,
                defaults::MIN_TIMEOUT_SECS,
                defaults::MAX_TIMEOUT_SECS,
                defaults::CONNECTION_TIMEOUT_SECS,
            ),
            (
                "finalization_timeout_secs",
                &mut config.finalization_timeout_secs,
                defaults::MIN_TIMEOUT_SECS,
                defaults::MAX_FINALIZATION_TIMEOUT_SECS,
                DEFAULT_FINALIZATION_TIMEOUT_SECS,
            ),
            (
                "poll_interval_ms",
                &mut config.poll_interval_ms,
                defaults::MIN_POLL_INTERVAL_MS,
                defaults::MAX_POLL_INTERVAL_MS,
                DEFAULT_POLL_INTERVAL_MS,
            ),
        ];

        for (field, value, min, max, default) in ranges {
            if let Err(e) = Self::validate_range(field, *value, min, max) {
                self.fix(e, value, default, &mut fixed_issues)?;
            }
        }

        if !fixed_issues.is_empty() && log::log_enabled!(log::Level::Info) {
            info!("Auto-fixed {} configuration issue(s)", fixed_issues.len());
        }

        Ok(fixed_issues)
    }

    fn validate_endpoint(field: &'static str, address: &str) -> ValidationResult<()> {
        match parse_endpoint(address) {
            Ok(url) if url.host().is_some() => Ok(()),
            _ => Err(ConfigValidationError::InvalidEndpoint {
                field,
                address: address.to_owned(),
            }),
        }
    }

    fn validate_contract_address(address: &str) -> ValidationResult<()> {
        let valid = address.len() > PREFIX_CONTRACT_ADDRESS.len()
            && address.starts_with(PREFIX_CONTRACT_ADDRESS)
            && address.chars().all(|c| c.is_ascii_alphanumeric());

        if !valid {
            return Err(ConfigValidationError::InvalidContractAddress(
                address.to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_range(field: &'static str, value: u64, min: u64, max: u64) -> ValidationResult<()> {
        if value < min || value > max {
            return Err(ConfigValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }
}

impl ValidatedConfig {
    pub fn node_address(&self) -> &str {
        self.node_address
            .as_deref()
            .unwrap_or_else(|| self.network.rpc_address())
    }

    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
        }
    }

    pub fn to_client_settings(&self) -> ClientSettings {
        ClientSettings {
            contract_address: self.contract_address.clone(),
            final_reads: self.final_reads,
            finalization_timeout: Duration::from_secs(self.finalization_timeout_secs),
            poll_interval: self.poll_interval(),
            max_gas: self.max_gas,
            fee: self.fee,
            coins: 0,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P, strict_mode: bool, auto_fix: bool) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        let mut config: ValidatedConfig = serde_json::from_str(&content).map_err(|e| {
            anyhow!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        ConfigValidator::new(strict_mode, auto_fix).validate(&mut config)?;
        Ok(config)
    }

    /// Write the default configuration as a template
    pub fn generate_template<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(&ValidatedConfig::default())?;
        std::fs::write(&path, content).map_err(|e| {
            anyhow!(
                "Failed to write template to '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "Configuration template generated at: {}",
                path.as_ref().display()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let mut config = ValidatedConfig::default();
        let fixes = ConfigValidator::new(true, false).validate(&mut config).unwrap();
        assert!(fixes.is_empty());
        assert_eq!(config.node_address(), BUILDNET_RPC_ADDRESS);
    }

    #[test]
    fn test_strict_mode_rejects_invalid_contract() {
        let mut config = ValidatedConfig {
            contract_address: "AU12abc".to_owned(),
            ..Default::default()
        };
        let error = ConfigValidator::new(true, true)
            .validate(&mut config)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid contract address: 'AU12abc' - must start with 'AS'"
        );
    }

    #[test]
    fn test_auto_fix_restores_defaults() {
        let mut config = ValidatedConfig {
            contract_address: "not a contract".to_owned(),
            poll_interval_ms: 0,
            node_address: Some("http://".to_owned()),
            ..Default::default()
        };

        let fixes = ConfigValidator::new(false, true).validate(&mut config).unwrap();
        assert_eq!(fixes.len(), 3);
        assert_eq!(config.contract_address, DEFAULT_CONTRACT_ADDRESS);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.node_address, None);
    }

    #[test]
    fn test_network_endpoint() {
        let config = ValidatedConfig {
            network: Network::Local,
            ..Default::default()
        };
        assert_eq!(config.node_address(), LOCAL_RPC_ADDRESS);
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
    }
}
