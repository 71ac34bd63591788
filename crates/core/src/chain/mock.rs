//! In-memory chain for tests. Emulates just enough of the CREATE2 factory, the clone
//! factory, the throwaway deployer and keyless replays to exercise the orchestrator.

use super::{ChainReader, TransactionSender, TxReceipt};
use crate::bindings::clone_factory::TWCloneFactory;
use crate::bindings::deployer::ThrowawayDeployer;
use crate::registry::{InfraContractType, THROWAWAY_DEPLOYER_BYTECODE};
use crate::types::{fee::FeeEstimate, transaction::Transaction};
use crate::utils::clone::{clone_init_code, decode_initialized_clone, predict_clone_address};
use crate::utils::create2::{CREATE2_FACTORY_ADDRESS, create2_address};
use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bytes, Log, TxKind, U256, keccak256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use eyre::{Result, eyre};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub(crate) const GWEI: u128 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SentTransaction {
    Signed {
        to: Option<Address>,
        value: U256,
        data: Bytes,
        gas_limit: Option<u64>,
        fees: Option<FeeEstimate>,
    },
    Raw {
        from: Address,
        to: Option<Address>,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockState {
    code: HashMap<Address, Bytes>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    sent: Vec<SentTransaction>,
    calls: Vec<(Address, Bytes)>,
    receipts: u64,
}

impl MockState {
    fn has_code(&self, address: &Address) -> bool {
        self.code.get(address).is_some_and(|code| !code.is_empty())
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or_default()
    }

    fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }
}

struct Execution {
    logs: Vec<Log>,
    output: Bytes,
}

pub(crate) struct MockChain {
    pub(crate) chain_id: u64,
    pub(crate) signer: Address,
    pub(crate) base_fee: Option<u128>,
    pub(crate) gas_price: u128,
    pub(crate) max_priority_fee: Option<u128>,
    pub(crate) history_priority_fee: Option<u128>,
    /// Signed sends with an explicit gas limit below this are rejected.
    pub(crate) intrinsic_gas: u64,
    /// Value transfers are mined but credit nothing.
    pub(crate) drop_transfers: bool,
    pub(crate) emit_proxy_events: bool,
    /// Extra addresses that behave like the clone factory.
    pub(crate) clone_factories: HashSet<Address>,
    /// `factory → address` its custom function deploys.
    pub(crate) custom_factories: HashMap<Address, Address>,
    pub(crate) state: Mutex<MockState>,
}

impl MockChain {
    pub(crate) fn new(chain_id: u64) -> Self {
        let signer = Address::repeat_byte(0x5e);
        let mut state = MockState::default();
        state
            .balances
            .insert(signer, U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18)));

        Self {
            chain_id,
            signer,
            base_fee: Some(10 * GWEI),
            gas_price: 20 * GWEI,
            max_priority_fee: Some(2 * GWEI),
            history_priority_fee: None,
            intrinsic_gas: 21_000,
            drop_transfers: false,
            emit_proxy_events: true,
            clone_factories: HashSet::new(),
            custom_factories: HashMap::new(),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_code(&self, address: Address, code: Bytes) {
        self.lock().code.insert(address, code);
    }

    pub(crate) fn set_nonce(&self, address: Address, nonce: u64) {
        self.lock().nonces.insert(address, nonce);
    }

    pub(crate) fn has_code(&self, address: Address) -> bool {
        self.lock().has_code(&address)
    }

    pub(crate) fn sent(&self) -> Vec<SentTransaction> {
        self.lock().sent.clone()
    }

    pub(crate) fn calls(&self) -> Vec<(Address, Bytes)> {
        self.lock().calls.clone()
    }

    fn transfer(&self, state: &mut MockState, from: Address, to: Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        let balance = state.balance(&from);
        if balance < value {
            return false;
        }
        state.balances.insert(from, balance - value);
        if !self.drop_transfers {
            let to_balance = state.balance(&to);
            state.balances.insert(to, to_balance + value);
        }
        true
    }

    fn deploy_code(state: &mut MockState, address: Address, init_code: &[u8]) -> bool {
        if state.has_code(&address) {
            return false;
        }
        // The init code stands in for the runtime code; only "has code" matters here.
        state.code.insert(address, Bytes::copy_from_slice(init_code));
        true
    }

    fn is_clone_factory(&self, state: &MockState, address: &Address) -> bool {
        self.clone_factories.contains(address)
            || (*address == InfraContractType::CloneFactory.address() && state.has_code(address))
    }

    fn execute_call(
        &self,
        state: &mut MockState,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> std::result::Result<Execution, String> {
        state.calls.push((to, Bytes::copy_from_slice(data)));

        if to == CREATE2_FACTORY_ADDRESS && state.has_code(&to) {
            if data.len() < 32 {
                return Err("create2 factory: short calldata".into());
            }
            let salt = B256::from_slice(&data[..32]);
            let init_code = &data[32..];
            let target = create2_address(to, salt, keccak256(init_code));
            if !Self::deploy_code(state, target, init_code) {
                return Err("create2 factory: collision".into());
            }
            return Ok(Execution {
                logs: vec![],
                output: Bytes::copy_from_slice(target.as_slice()),
            });
        }

        if self.is_clone_factory(state, &to) {
            let call = TWCloneFactory::deployProxyByImplementationCall::abi_decode(data, true)
                .map_err(|e| e.to_string())?;
            let proxy = predict_clone_address(to, call._implementation, from, call._salt);
            if !Self::deploy_code(state, proxy, &clone_init_code(call._implementation)) {
                return Err("clone factory: proxy exists".into());
            }
            if !call._data.is_empty() {
                state.calls.push((proxy, call._data.clone()));
            }

            let mut logs = vec![];
            if self.emit_proxy_events {
                let event = TWCloneFactory::ProxyDeployed {
                    implementation: call._implementation,
                    proxy,
                    deployer: from,
                };
                logs.push(Log {
                    address: to,
                    data: event.encode_log_data(),
                });
            }
            return Ok(Execution {
                logs,
                output: proxy.abi_encode().into(),
            });
        }

        // Get-or-deploy: an existing instance is returned as is.
        if let Some(deployed) = self.custom_factories.get(&to) {
            if !state.has_code(deployed) {
                Self::deploy_code(state, *deployed, data);
            }
            return Ok(Execution {
                logs: vec![],
                output: deployed.abi_encode().into(),
            });
        }

        Ok(Execution {
            logs: vec![],
            output: Bytes::new(),
        })
    }

    fn execute_create(
        &self,
        state: &mut MockState,
        created: Address,
        init_code: &[u8],
    ) -> std::result::Result<Execution, String> {
        if let Some(args) = init_code.strip_prefix(THROWAWAY_DEPLOYER_BYTECODE) {
            let (txs,) =
                <(Vec<ThrowawayDeployer::Transaction>,)>::abi_decode_params(args, true)
                    .map_err(|e| e.to_string())?;
            let mut logs = vec![];
            for tx in txs {
                if state.has_code(&tx.predictedAddress) {
                    continue;
                }
                let execution = self.execute_call(state, created, tx.to, &tx.data)?;
                logs.extend(execution.logs);
            }
            return Ok(Execution {
                logs,
                output: Bytes::new(),
            });
        }

        if !Self::deploy_code(state, created, init_code) {
            return Err("create: collision".into());
        }
        if let Some((_, init_data)) = decode_initialized_clone(init_code) {
            state.calls.push((created, Bytes::copy_from_slice(init_data)));
        }
        Ok(Execution {
            logs: vec![],
            output: Bytes::new(),
        })
    }

    /// Runs one transaction. State changes other than the nonce roll back on revert.
    fn apply(
        &self,
        state: &mut MockState,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: &[u8],
    ) -> (TxReceipt, std::result::Result<Execution, String>) {
        let nonce = state.nonce(&from);
        state.nonces.insert(from, nonce + 1);
        let snapshot = state.clone();

        let created = to.is_none().then(|| from.create(nonce));
        let result = if !self.transfer(state, from, to.or(created).unwrap_or_default(), value) {
            Err("insufficient balance for value".to_string())
        } else {
            match to {
                Some(to) => self.execute_call(state, from, to, data),
                None => self.execute_create(state, from.create(nonce), data),
            }
        };

        if result.is_err() {
            let sent = std::mem::take(&mut state.sent);
            let receipts = state.receipts;
            *state = snapshot;
            state.sent = sent;
            state.receipts = receipts;
        }

        state.receipts += 1;
        let receipt = TxReceipt {
            tx_hash: B256::from(U256::from(state.receipts)),
            status: result.is_ok(),
            contract_address: created.filter(|_| result.is_ok()),
            logs: result
                .as_ref()
                .map(|execution| execution.logs.clone())
                .unwrap_or_default(),
        };
        (receipt, result)
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self.lock().code.get(&address).cloned().unwrap_or_default())
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.lock().balance(&address))
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.lock().nonce(&address))
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>> {
        Ok(self.base_fee)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.gas_price)
    }

    async fn max_priority_fee(&self) -> Result<Option<u128>> {
        Ok(self.max_priority_fee)
    }

    async fn fee_history_priority_fee(&self) -> Result<Option<u128>> {
        Ok(self.history_priority_fee)
    }

    async fn call(&self, from: Address, tx: &Transaction) -> Result<Bytes> {
        let mut scratch = self.lock().clone();
        let (_, result) = self.apply(&mut scratch, from, tx.to, tx.value, &tx.data);
        result
            .map(|execution| execution.output)
            .map_err(|e| eyre!("execution reverted: {}", e))
    }
}

#[async_trait]
impl TransactionSender for MockChain {
    fn address(&self) -> Address {
        self.signer
    }

    async fn send_transaction(
        &self,
        tx: Transaction,
        fees: Option<FeeEstimate>,
    ) -> Result<TxReceipt> {
        if let Some(gas_limit) = tx.gas_limit.filter(|gas| *gas < self.intrinsic_gas) {
            return Err(eyre!(
                "intrinsic gas too low: have {}, want {}",
                gas_limit,
                self.intrinsic_gas
            ));
        }
        let mut state = self.lock();
        state.sent.push(SentTransaction::Signed {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            gas_limit: tx.gas_limit,
            fees,
        });
        let (receipt, _) = self.apply(&mut state, self.signer, tx.to, tx.value, &tx.data);
        Ok(receipt)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxReceipt> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())?;
        let TxEnvelope::Legacy(signed) = envelope else {
            return Err(eyre!("mock chain only replays legacy transactions"));
        };
        let from = signed.recover_signer()?;
        let tx = signed.tx();

        let mut state = self.lock();
        if state.nonce(&from) != tx.nonce {
            return Err(eyre!("nonce too low: {} for {}", tx.nonce, from));
        }
        let cost = U256::from(tx.gas_limit) * U256::from(tx.gas_price);
        let balance = state.balance(&from);
        if balance < cost + tx.value {
            return Err(eyre!(
                "insufficient funds for gas * price + value: have {} want {}",
                balance,
                cost
            ));
        }
        state.balances.insert(from, balance - cost);

        let to = match tx.to {
            TxKind::Call(to) => Some(to),
            TxKind::Create => None,
        };
        state.sent.push(SentTransaction::Raw { from, to });
        let (receipt, _) = self.apply(&mut state, from, to, tx.value, &tx.input);
        Ok(receipt)
    }
}
