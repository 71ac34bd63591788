pub mod gas_station;

use crate::chain::ChainReader;
use crate::types::fee::FeeEstimate;
use eyre::Result;
use log::debug;
use reqwest::Client;
use std::collections::BTreeMap;

const GWEI: u128 = 1_000_000_000;

/// BNB Chain, BNB testnet, XDC, XDC Apothem.
pub const DEFAULT_LEGACY_CHAINS: [u64; 4] = [56, 97, 50, 51];
pub const DEFAULT_MAX_GAS_PRICE: u128 = 300 * GWEI;
const FEE_BUMP_PERCENT: u128 = 110;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasStation {
    pub url: String,
    /// Priority fee used whenever the oracle cannot be read.
    pub floor_priority_fee: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfig {
    pub legacy_chains: Vec<u64>,
    /// Cap on legacy gas prices.
    pub max_gas_price: u128,
    pub gas_stations: BTreeMap<u64, GasStation>,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            legacy_chains: DEFAULT_LEGACY_CHAINS.to_vec(),
            max_gas_price: DEFAULT_MAX_GAS_PRICE,
            gas_stations: BTreeMap::from([
                (
                    137,
                    GasStation {
                        url: "https://gasstation.polygon.technology/v2".to_string(),
                        floor_priority_fee: 31 * GWEI,
                    },
                ),
                (
                    80002,
                    GasStation {
                        url: "https://gasstation.polygon.technology/amoy".to_string(),
                        floor_priority_fee: 25 * GWEI,
                    },
                ),
            ]),
        }
    }
}

fn bump(fee: u128) -> u128 {
    fee.saturating_mul(FEE_BUMP_PERCENT) / 100
}

/// Prices live sends. Keyless replays carry their own fixed price and never come here.
pub struct FeeEstimator {
    config: FeeConfig,
    client: Client,
}

impl FeeEstimator {
    pub fn new(config: FeeConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub async fn estimate<R: ChainReader + ?Sized>(&self, reader: &R) -> Result<FeeEstimate> {
        let chain_id = reader.chain_id().await?;
        if self.config.legacy_chains.contains(&chain_id) {
            debug!("Chain {} is priced with legacy gas price", chain_id);
            return self.legacy(reader).await;
        }

        let priority_fee = match self.config.gas_stations.get(&chain_id) {
            Some(station) => Some(gas_station::priority_fee_or_floor(&self.client, station).await),
            None => match reader.max_priority_fee().await? {
                Some(fee) => Some(fee),
                None => reader.fee_history_priority_fee().await?,
            },
        };
        let Some(priority_fee) = priority_fee else {
            debug!("No priority fee available on chain {}", chain_id);
            return self.legacy(reader).await;
        };

        // A chain without base fees cannot take a type-2 transaction.
        let Some(base_fee) = reader.latest_base_fee().await? else {
            debug!("Chain {} reports no base fee", chain_id);
            return self.legacy(reader).await;
        };

        let max_priority_fee_per_gas = bump(priority_fee);
        Ok(FeeEstimate::Eip1559 {
            max_fee_per_gas: base_fee
                .saturating_mul(2)
                .saturating_add(max_priority_fee_per_gas),
            max_priority_fee_per_gas,
            base_fee,
        })
    }

    async fn legacy<R: ChainReader + ?Sized>(&self, reader: &R) -> Result<FeeEstimate> {
        let gas_price = reader.gas_price().await?;
        Ok(FeeEstimate::Legacy {
            gas_price: bump(gas_price).min(self.config.max_gas_price),
        })
    }
}
