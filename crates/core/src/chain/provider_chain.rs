use super::{ChainReader, TransactionSender, TxReceipt};
use crate::error::DeployError;
use crate::types::{fee::FeeEstimate, transaction::Transaction};
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, U128, U256};
use alloy::providers::{PendingTransactionBuilder, PendingTransactionError, Provider, WatchTxError};
use alloy::rpc::types::{BlockNumberOrTag, TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use eyre::{Result, eyre};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct BlockFeeFields {
    #[serde(rename = "baseFeePerGas", default)]
    base_fee_per_gas: Option<U128>,
}

/// [`ChainReader`] + [`TransactionSender`] over an alloy provider that carries a wallet.
///
/// Reads are retried on rate limits. Non-empty code lookups are cached since deployed
/// code does not go away; empty results always go back to the node.
pub struct ProviderChain<P> {
    provider: P,
    signer: Address,
    receipt_timeout: Duration,
    code_cache: Arc<Mutex<HashMap<Address, Bytes>>>,
}

impl<P> ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    const MAX_RETRIES: u32 = 10;
    const RETRY_DELAY: Duration = Duration::from_secs(1);
    const FEE_HISTORY_BLOCKS: u64 = 5;

    pub fn new(provider: P, signer: Address, receipt_timeout: Duration) -> Self {
        Self {
            provider,
            signer,
            receipt_timeout,
            code_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn with_retry<T, F, Fut>(&self, label: &str, request: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = TransportResult<T>> + Send,
        T: Send,
    {
        let mut attempts = 0;

        while attempts < Self::MAX_RETRIES {
            match request().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    // If it's not a rate limit error, return the error immediately
                    if !e.to_string().contains("429") && !e.to_string().contains("quota") {
                        return Err(e.into());
                    }

                    info!("Rate limit error on {}: {}", label, e);
                    attempts += 1;
                    tokio::time::sleep(Self::RETRY_DELAY).await;
                }
            }
        }

        Err(eyre!(
            "Failed to make {} call after {} attempts",
            label,
            Self::MAX_RETRIES
        ))
    }

    async fn wait_for_receipt(
        &self,
        pending: PendingTransactionBuilder<alloy::network::Ethereum>,
    ) -> Result<TxReceipt> {
        let tx_hash = *pending.tx_hash();
        debug!("Waiting for receipt of {}", tx_hash);

        match pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
        {
            Ok(receipt) => Ok(convert_receipt(receipt)),
            Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => {
                Err(DeployError::ReceiptTimeout { tx_hash }.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn convert_receipt(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: receipt.transaction_hash,
        status: receipt.status(),
        contract_address: receipt.contract_address,
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    }
}

fn to_request(from: Address, tx: &Transaction) -> TransactionRequest {
    let request = TransactionRequest::default()
        .with_from(from)
        .with_value(tx.value);
    let mut request = match tx.to {
        Some(to) => request.with_to(to).with_input(tx.data.clone()),
        None => request.with_deploy_code(tx.data.clone()),
    };
    if let Some(gas_limit) = tx.gas_limit {
        request.set_gas_limit(gas_limit);
    }
    request
}

#[async_trait]
impl<P> ChainReader for ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    async fn chain_id(&self) -> Result<u64> {
        self.with_retry("eth_chainId", || async { self.provider.get_chain_id().await })
            .await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        if let Some(code) = self.code_cache.lock().await.get(&address) {
            return Ok(code.clone());
        }

        let code = self
            .with_retry("eth_getCode", || async {
                self.provider.get_code_at(address).await
            })
            .await?;

        if !code.is_empty() {
            self.code_cache.lock().await.insert(address, code.clone());
        }
        Ok(code)
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.with_retry("eth_getBalance", || async {
            self.provider.get_balance(address).await
        })
        .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        self.with_retry("eth_getTransactionCount", || async {
            self.provider.get_transaction_count(address).await
        })
        .await
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>> {
        let block: Option<BlockFeeFields> = self
            .with_retry("eth_getBlockByNumber", || async {
                self.provider
                    .raw_request(
                        "eth_getBlockByNumber".into(),
                        (BlockNumberOrTag::Latest, false),
                    )
                    .await
            })
            .await?;

        Ok(block
            .and_then(|b| b.base_fee_per_gas)
            .map(|fee| fee.to::<u128>()))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.with_retry("eth_gasPrice", || async { self.provider.get_gas_price().await })
            .await
    }

    async fn max_priority_fee(&self) -> Result<Option<u128>> {
        match self
            .with_retry("eth_maxPriorityFeePerGas", || async {
                self.provider.get_max_priority_fee_per_gas().await
            })
            .await
        {
            Ok(fee) => Ok(Some(fee)),
            Err(e) => {
                debug!("eth_maxPriorityFeePerGas unavailable: {}", e);
                Ok(None)
            }
        }
    }

    async fn fee_history_priority_fee(&self) -> Result<Option<u128>> {
        let history = match self
            .with_retry("eth_feeHistory", || async {
                self.provider
                    .get_fee_history(Self::FEE_HISTORY_BLOCKS, BlockNumberOrTag::Latest, &[50.0])
                    .await
            })
            .await
        {
            Ok(history) => history,
            Err(e) => {
                debug!("eth_feeHistory unavailable: {}", e);
                return Ok(None);
            }
        };

        let rewards: Vec<u128> = history
            .reward
            .unwrap_or_default()
            .into_iter()
            .filter_map(|block| block.first().copied())
            .filter(|reward| *reward > 0)
            .collect();

        if rewards.is_empty() {
            return Ok(None);
        }
        Ok(Some(rewards.iter().sum::<u128>() / rewards.len() as u128))
    }

    async fn call(&self, from: Address, tx: &Transaction) -> Result<Bytes> {
        let request = to_request(from, tx);
        self.with_retry("eth_call", || async {
            self.provider
                .raw_request("eth_call".into(), (request.clone(), BlockNumberOrTag::Latest))
                .await
        })
        .await
    }
}

#[async_trait]
impl<P> TransactionSender for ProviderChain<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    fn address(&self) -> Address {
        self.signer
    }

    async fn send_transaction(
        &self,
        tx: Transaction,
        fees: Option<FeeEstimate>,
    ) -> Result<TxReceipt> {
        let mut request = to_request(self.signer, &tx);
        match fees {
            Some(FeeEstimate::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                ..
            }) => {
                request.set_max_fee_per_gas(max_fee_per_gas);
                request.set_max_priority_fee_per_gas(max_priority_fee_per_gas);
            }
            Some(FeeEstimate::Legacy { gas_price }) => request.set_gas_price(gas_price),
            None => {}
        }

        let pending = self.provider.send_transaction(request).await?;
        info!("Sent transaction {}", pending.tx_hash());
        self.wait_for_receipt(pending).await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxReceipt> {
        let pending = match self.provider.send_raw_transaction(&raw).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Raw transaction rejected: {}", e);
                return Err(e.into());
            }
        };
        info!("Sent raw transaction {}", pending.tx_hash());
        self.wait_for_receipt(pending).await
    }
}
