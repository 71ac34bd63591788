use crate::fees::{FeeConfig, GasStation};
use crate::types::deploy_config::{DeployConfig, InfraMode};
use dotenv::dotenv;
use eyre::{Result, eyre};
use std::str::FromStr;
use std::time::Duration;
use std::{env, fs};
use toml::Value;

const GWEI: f64 = 1e9;

pub struct ConfigWrapper {
    raw_config: Value,
}

impl ConfigWrapper {
    pub fn new(raw_config: Value) -> Self {
        Self { raw_config }
    }

    /// Reads `path` (default `config.toml`) and loads `.env` so `env:` endpoints resolve.
    pub fn from_file(path: Option<&str>) -> Result<Self> {
        dotenv().ok();
        let config_content = if let Some(p) = path {
            fs::read_to_string(p)?
        } else {
            fs::read_to_string("config.toml")?
        };
        config_content.parse()
    }

    pub fn get_rpc_url(&self, chain_id: u64) -> Result<String> {
        let url_str = self
            .raw_config
            .get("rpc_endpoints")
            .and_then(|e| e.get(chain_id.to_string()))
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("URL not found for chain_id: {}", chain_id))?;

        if let Some(env_var) = url_str.strip_prefix("env:") {
            env::var(env_var).map_err(|_| eyre!("Environment variable {} not set", env_var))
        } else {
            Ok(url_str.to_string())
        }
    }

    pub fn get_block_explorer_url(&self, chain_id: u64) -> Result<String> {
        let url_str = self
            .raw_config
            .get("block_explorers")
            .and_then(|e| e.get(chain_id.to_string()))
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("Block explorer URL not found for chain_id: {}", chain_id))?;

        Ok(url_str.trim_end_matches('/').to_string())
    }

    fn get_deploy_value(&self, chain_id: u64, key: &str) -> Option<&Value> {
        // Try chain specific value first
        self.raw_config
            .get("deploy")
            .and_then(|d| d.get(chain_id.to_string()))
            .and_then(|d| d.get(key))
            .or_else(|| {
                // Fallback to default if chain specific not found
                self.raw_config
                    .get("deploy")
                    .and_then(|d| d.get("default"))
                    .and_then(|d| d.get(key))
            })
    }

    pub fn deploy_config(&self, chain_id: u64) -> Result<DeployConfig> {
        let mut config = DeployConfig {
            fees: self.fee_config()?,
            ..DeployConfig::default()
        };

        if let Some(value) = self.get_deploy_value(chain_id, "infra_batch_size") {
            let size = value
                .as_integer()
                .filter(|size| *size > 0)
                .ok_or_else(|| eyre!("infra_batch_size must be a positive integer"))?;
            config.infra_batch_size = size as usize;
        }

        if let Some(value) = self.get_deploy_value(chain_id, "infra_mode") {
            config.infra_mode = match value.as_str() {
                Some("keyless") => InfraMode::Keyless,
                Some("throwaway") => InfraMode::Throwaway,
                other => return Err(eyre!("unknown infra_mode: {:?}", other)),
            };
        }

        if let Some(value) = self.get_deploy_value(chain_id, "receipt_timeout_secs") {
            let secs = value
                .as_integer()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| eyre!("receipt_timeout_secs must be a positive integer"))?;
            config.receipt_timeout = Duration::from_secs(secs as u64);
        }

        Ok(config)
    }

    pub fn fee_config(&self) -> Result<FeeConfig> {
        let mut config = FeeConfig::default();
        let Some(fees) = self.raw_config.get("fees") else {
            return Ok(config);
        };

        if let Some(chains) = fees.get("legacy_chains") {
            config.legacy_chains = chains
                .as_array()
                .ok_or_else(|| eyre!("fees.legacy_chains must be an array"))?
                .iter()
                .map(|c| {
                    c.as_integer()
                        .map(|c| c as u64)
                        .ok_or_else(|| eyre!("fees.legacy_chains must hold chain ids"))
                })
                .collect::<Result<_>>()?;
        }

        if let Some(max) = fees.get("max_gas_price_gwei") {
            config.max_gas_price = gwei_to_wei(max)
                .ok_or_else(|| eyre!("fees.max_gas_price_gwei must be a number"))?;
        }

        if let Some(stations) = fees.get("gas_stations").and_then(|s| s.as_table()) {
            for (chain, station) in stations {
                let chain_id: u64 = chain
                    .parse()
                    .map_err(|_| eyre!("gas station key {} is not a chain id", chain))?;
                let url = station
                    .get("url")
                    .and_then(|u| u.as_str())
                    .ok_or_else(|| eyre!("gas station for {} has no url", chain_id))?;
                let floor = station
                    .get("floor_gwei")
                    .and_then(gwei_to_wei)
                    .unwrap_or_default();
                config.gas_stations.insert(
                    chain_id,
                    GasStation {
                        url: url.to_string(),
                        floor_priority_fee: floor,
                    },
                );
            }
        }

        Ok(config)
    }
}

impl FromStr for ConfigWrapper {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let raw_config: Value = s.parse::<Value>()?;
        Ok(Self { raw_config })
    }
}

fn gwei_to_wei(value: &Value) -> Option<u128> {
    match value {
        Value::Integer(i) if *i >= 0 => Some(*i as u128 * GWEI as u128),
        Value::Float(f) if *f >= 0.0 => Some((f * GWEI).round() as u128),
        _ => None,
    }
}
