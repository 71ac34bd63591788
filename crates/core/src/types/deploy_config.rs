use crate::fees::FeeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How infrastructure batches reach the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfraMode {
    /// Fund each keyless sender, then replay its signed transaction.
    #[default]
    Keyless,
    /// One contract creation per batch from the caller's signer.
    Throwaway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub infra_batch_size: usize,
    pub infra_mode: InfraMode,
    pub receipt_timeout: Duration,
    pub fees: FeeConfig,
}

impl DeployConfig {
    pub const DEFAULT_INFRA_BATCH_SIZE: usize = 5;
    pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            infra_batch_size: Self::DEFAULT_INFRA_BATCH_SIZE,
            infra_mode: InfraMode::default(),
            receipt_timeout: Self::DEFAULT_RECEIPT_TIMEOUT,
            fees: FeeConfig::default(),
        }
    }
}
