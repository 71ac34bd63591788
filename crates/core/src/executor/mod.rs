pub mod orchestrator;
pub mod state;

pub use orchestrator::Orchestrator;
pub use state::{DeploymentOutcome, DeploymentState};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{MockChain, SentTransaction};
    use crate::error::DeployError;
    use crate::planner::plan_builder::tests::{
        CHAIN, auto_factory_request, build, via_factory_request,
    };
    use crate::registry::{InfraContractType, THROWAWAY_DEPLOYER_BYTECODE};
    use crate::strategy::Strategy;
    use crate::types::deploy_config::{DeployConfig, InfraMode};
    use crate::types::deployment_group::GroupType;
    use crate::types::metadata::{
        CustomFactoryInput, DeployType, ExtendedDeployMetadata, FactoryDeploymentData,
    };
    use crate::types::request::DeploymentRequest;
    use crate::utils::create2::CREATE2_FACTORY_ADDRESS;
    use crate::{execute_deployment, plan_deployment};
    use crate::chain::{ChainReader, TransactionSender, TxReceipt};
    use crate::types::{fee::FeeEstimate, transaction::Transaction};
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::{Address, Bytes, U256, keccak256};
    use async_trait::async_trait;
    use eyre::{Result, eyre};
    use std::collections::BTreeMap;

    fn raw_senders(chain: &MockChain) -> Vec<Address> {
        chain
            .sent()
            .into_iter()
            .filter_map(|tx| match tx {
                SentTransaction::Raw { from, .. } => Some(from),
                SentTransaction::Signed { .. } => None,
            })
            .collect()
    }

    /// Signs with the nonce read right before sending, as a provider's nonce filler does,
    /// so two sends in flight at once end up with the same nonce.
    struct PendingNonceChain {
        inner: MockChain,
    }

    #[async_trait]
    impl ChainReader for PendingNonceChain {
        async fn chain_id(&self) -> Result<u64> {
            self.inner.chain_id().await
        }

        async fn get_code(&self, address: Address) -> Result<Bytes> {
            self.inner.get_code(address).await
        }

        async fn get_balance(&self, address: Address) -> Result<U256> {
            self.inner.get_balance(address).await
        }

        async fn get_transaction_count(&self, address: Address) -> Result<u64> {
            self.inner.get_transaction_count(address).await
        }

        async fn latest_base_fee(&self) -> Result<Option<u128>> {
            self.inner.latest_base_fee().await
        }

        async fn gas_price(&self) -> Result<u128> {
            self.inner.gas_price().await
        }

        async fn max_priority_fee(&self) -> Result<Option<u128>> {
            self.inner.max_priority_fee().await
        }

        async fn fee_history_priority_fee(&self) -> Result<Option<u128>> {
            self.inner.fee_history_priority_fee().await
        }

        async fn call(&self, from: Address, tx: &Transaction) -> Result<Bytes> {
            self.inner.call(from, tx).await
        }
    }

    #[async_trait]
    impl TransactionSender for PendingNonceChain {
        fn address(&self) -> Address {
            self.inner.signer
        }

        async fn send_transaction(
            &self,
            tx: Transaction,
            fees: Option<FeeEstimate>,
        ) -> Result<TxReceipt> {
            let nonce = self.inner.get_transaction_count(self.inner.signer).await?;
            tokio::task::yield_now().await;
            if self.inner.get_transaction_count(self.inner.signer).await? != nonce {
                return Err(eyre!("replacement transaction underpriced (nonce {} reused)", nonce));
            }
            self.inner.send_transaction(tx, fees).await
        }

        async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxReceipt> {
            self.inner.send_raw_transaction(raw).await
        }
    }

    #[tokio::test]
    async fn test_auto_factory_on_unseen_chain() {
        let chain = MockChain::new(CHAIN);
        let config = DeployConfig::default();

        let outcome = execute_deployment(&chain, &auto_factory_request(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::AutoFactory);
        assert!(!outcome.already_deployed);
        assert!(chain.has_code(outcome.address));
        assert!(chain.has_code(CREATE2_FACTORY_ADDRESS));
        assert!(chain.has_code(InfraContractType::Forwarder.address()));
        assert!(chain.has_code(InfraContractType::CloneFactory.address()));
        assert_eq!(
            outcome.history,
            vec![
                DeploymentState::Planning,
                DeploymentState::Funding(0),
                DeploymentState::Submitting(0),
                DeploymentState::Funding(1),
                DeploymentState::Submitting(1),
                DeploymentState::ImplementationDeploy,
                DeploymentState::ProxyDeploy,
                DeploymentState::Completed,
            ]
        );
        // Factory sender + two infra senders replayed their presigned transactions.
        assert_eq!(raw_senders(&chain).len(), 3);
        // Every live send was priced.
        assert!(chain.sent().iter().all(|tx| match tx {
            SentTransaction::Signed { fees, .. } => fees.is_some(),
            SentTransaction::Raw { .. } => true,
        }));

        let replan = plan_deployment(&chain, chain.signer, &auto_factory_request(), &config)
            .await
            .unwrap();
        assert_eq!(
            replan.iter().map(|g| g.contract_type).collect::<Vec<_>>(),
            vec![GroupType::Proxy]
        );
    }

    #[tokio::test]
    async fn test_keyless_funding_waits_for_each_transfer() {
        let chain = PendingNonceChain {
            inner: MockChain::new(CHAIN),
        };

        let outcome = execute_deployment(&chain, &auto_factory_request(), &DeployConfig::default())
            .await
            .unwrap();

        assert!(chain.inner.has_code(outcome.address));
        assert!(chain.inner.has_code(InfraContractType::Forwarder.address()));
        assert!(chain.inner.has_code(InfraContractType::CloneFactory.address()));
    }

    #[tokio::test]
    async fn test_funding_transfers_leave_gas_to_estimation() {
        let chain = MockChain {
            intrinsic_gas: 60_000,
            ..MockChain::new(CHAIN)
        };

        let outcome = execute_deployment(&chain, &auto_factory_request(), &DeployConfig::default())
            .await
            .unwrap();

        assert!(chain.has_code(outcome.address));
        let transfers: Vec<_> = chain
            .sent()
            .into_iter()
            .filter(|tx| matches!(tx, SentTransaction::Signed { data, .. } if data.is_empty()))
            .collect();
        assert_eq!(transfers.len(), 3);
        assert!(transfers.iter().all(|tx| matches!(
            tx,
            SentTransaction::Signed { gas_limit: None, .. }
        )));
    }

    #[tokio::test]
    async fn test_spent_keyless_sender_without_code_fails() {
        let chain = MockChain::new(CHAIN);
        let forwarder = InfraContractType::Forwarder.contract();
        // Nonce consumed by a replay that reverted, nothing was deployed.
        chain.set_nonce(forwarder.keyless_from, 1);

        let err = execute_deployment(&chain, &auto_factory_request(), &DeployConfig::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already used its nonce"));
        assert!(!chain.has_code(forwarder.predicted_address));
        assert_eq!(
            chain.sent().iter().filter(|tx| matches!(tx, SentTransaction::Signed { .. })).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_redeploy_creates_new_proxy() {
        let chain = MockChain::new(CHAIN);
        let config = DeployConfig::default();

        let first = execute_deployment(&chain, &auto_factory_request().with_proxy_salt("a"), &config)
            .await
            .unwrap();
        let second = execute_deployment(&chain, &auto_factory_request().with_proxy_salt("b"), &config)
            .await
            .unwrap();

        assert_ne!(first.address, second.address);
        assert!(chain.has_code(second.address));
        assert_eq!(
            second.history,
            vec![
                DeploymentState::Planning,
                DeploymentState::ProxyDeploy,
                DeploymentState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_throwaway_mode_batches_infra_in_one_creation() {
        let chain = MockChain::new(CHAIN);
        let config = DeployConfig {
            infra_mode: InfraMode::Throwaway,
            ..DeployConfig::default()
        };

        let outcome = execute_deployment(&chain, &auto_factory_request(), &config)
            .await
            .unwrap();

        assert!(chain.has_code(outcome.address));
        assert!(chain.has_code(InfraContractType::CloneFactory.address()));
        // Only the CREATE2 factory itself goes through a keyless replay.
        assert_eq!(raw_senders(&chain).len(), 1);
        assert!(chain.sent().iter().any(|tx| matches!(
            tx,
            SentTransaction::Signed { to: None, data, .. } if data.starts_with(THROWAWAY_DEPLOYER_BYTECODE)
        )));
        assert!(outcome.history.contains(&DeploymentState::Submitting(1)));
        assert!(!outcome.history.contains(&DeploymentState::Funding(1)));
    }

    #[tokio::test]
    async fn test_underfunded_keyless_send_then_retry() {
        let mut chain = MockChain {
            drop_transfers: true,
            ..MockChain::new(CHAIN)
        };
        let config = DeployConfig::default();

        let err = execute_deployment(&chain, &auto_factory_request(), &config)
            .await
            .unwrap_err();
        let deploy_error = err.downcast_ref::<DeployError>().unwrap();
        assert!(matches!(
            deploy_error,
            DeployError::UnderfundedKeylessSend { balance, .. } if balance.is_zero()
        ));
        assert!(deploy_error.is_retryable());
        assert!(!chain.has_code(CREATE2_FACTORY_ADDRESS));

        chain.drop_transfers = false;
        let outcome = execute_deployment(&chain, &auto_factory_request(), &config)
            .await
            .unwrap();
        assert!(chain.has_code(outcome.address));
    }

    #[tokio::test]
    async fn test_via_factory_sends_one_transaction() {
        let factory = Address::repeat_byte(0xfa);
        let mut chain = MockChain::new(CHAIN);
        chain.clone_factories.insert(factory);

        let outcome = execute_deployment(&chain, &via_factory_request(factory), &DeployConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::ViaFactory);
        assert!(chain.has_code(outcome.address));
        assert_eq!(chain.sent().len(), 1);
        assert!(raw_senders(&chain).is_empty());
        assert_eq!(
            outcome.history,
            vec![
                DeploymentState::Planning,
                DeploymentState::ProxyDeploy,
                DeploymentState::Completed,
            ]
        );
        // The initializer was forwarded to the proxy.
        assert!(chain.calls().iter().any(|(to, _)| *to == outcome.address));
    }

    #[tokio::test]
    async fn test_missing_proxy_event() {
        let factory = Address::repeat_byte(0xfa);
        let mut chain = MockChain {
            emit_proxy_events: false,
            ..MockChain::new(CHAIN)
        };
        chain.clone_factories.insert(factory);

        let err = execute_deployment(&chain, &via_factory_request(factory), &DeployConfig::default())
            .await
            .unwrap_err();
        match err.downcast_ref::<DeployError>() {
            Some(DeployError::NoDeploymentEventFound { receipt }) => {
                assert!(receipt.status);
                assert!(receipt.logs.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reverted_proxy_deploy() {
        let factory = Address::repeat_byte(0xfa);
        let mut chain = MockChain::new(CHAIN);
        chain.clone_factories.insert(factory);
        let request = via_factory_request(factory).with_proxy_salt("fixed");

        execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap();
        // Same deployer, implementation and salt collide in the clone factory.
        let err = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::TransactionReverted { .. })
        ));
    }

    #[tokio::test]
    async fn test_via_proxy_initializes_atomically() {
        let chain = MockChain::new(CHAIN);
        let mut request = via_factory_request(Address::repeat_byte(0xfa));
        request.metadata.is_deployable_via_factory = false;
        request.metadata.is_deployable_via_proxy = true;

        let outcome = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::ViaProxy);
        assert_eq!(outcome.address, chain.signer.create(0));
        assert!(chain.has_code(outcome.address));
        // One creation, no separate initialize call anyone could front-run.
        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], SentTransaction::Signed { to: None, .. }));
        assert_eq!(outcome.tx_hashes.len(), 1);
        let initializer = chain
            .calls()
            .into_iter()
            .find(|(to, _)| *to == outcome.address)
            .map(|(_, data)| data)
            .unwrap();
        assert_eq!(&initializer[..4], &keccak256("initialize(address,string)")[..4]);
    }

    #[tokio::test]
    async fn test_stale_plan_is_rejected() {
        let chain = MockChain::new(CHAIN);
        let mut request = via_factory_request(Address::repeat_byte(0xfa));
        request.metadata.is_deployable_via_factory = false;
        request.metadata.is_deployable_via_proxy = true;
        let config = DeployConfig::default();

        let plan = build(&chain, &request, &config).await;
        chain.set_nonce(chain.signer, 3);

        let err = Orchestrator::new(&chain, &config)
            .execute(&plan)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nonce moved"));
    }

    #[tokio::test]
    async fn test_direct_deploy() {
        let chain = MockChain::new(CHAIN);
        let request = auto_factory_request().force_direct().with_constructor_arg(
            "_trustedForwarder",
            DynSolValue::Address(Address::repeat_byte(0x0f)),
        );

        let outcome = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.strategy, Strategy::Direct);
        assert_eq!(outcome.address, chain.signer.create(0));
        assert!(chain.has_code(outcome.address));
        assert_eq!(
            outcome.history,
            vec![
                DeploymentState::Planning,
                DeploymentState::DirectDeploy,
                DeploymentState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_custom_factory_is_idempotent() {
        let factory = Address::repeat_byte(0xcf);
        let deployed = Address::repeat_byte(0xd0);
        let mut chain = MockChain::new(CHAIN);
        chain.custom_factories.insert(factory, deployed);

        let mut data = FactoryDeploymentData::default();
        data.custom_factory_input = Some(CustomFactoryInput {
            factory_function: "deploy(address)".to_string(),
            params: vec![],
            custom_factory_addresses: BTreeMap::from([(CHAIN, factory)]),
        });
        let metadata = ExtendedDeployMetadata {
            deploy_type: DeployType::CustomFactory,
            factory_deployment_data: Some(data),
            ..Default::default()
        };
        let request = DeploymentRequest::new(
            crate::types::artifact::tests::sample_artifact(),
            metadata,
            CHAIN,
        )
        .with_initializer_args(vec![DynSolValue::Address(Address::repeat_byte(0xad))]);

        let first = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap();
        assert_eq!(first.address, deployed);
        assert!(!first.already_deployed);
        assert_eq!(first.tx_hashes.len(), 1);

        let second = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap();
        assert_eq!(second.address, deployed);
        assert!(second.already_deployed);
        assert!(second.tx_hashes.is_empty());
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_network_fails_in_planning() {
        let chain = MockChain::new(CHAIN);
        let mut request = auto_factory_request();
        request.metadata.networks_for_deployment =
            Some(crate::types::metadata::NetworksForDeployment {
                all_networks: false,
                networks_enabled: vec![1],
            });

        let err = execute_deployment(&chain, &request, &DeployConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeployError>(),
            Some(DeployError::DeploymentDisabled { chain_id: CHAIN })
        ));
        assert!(chain.sent().is_empty());
    }
}
