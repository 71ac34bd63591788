use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use alloy::signers::ledger::{HDPath, LedgerSigner};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::trezor::{TrezorHDPath, TrezorSigner};
use anyevm_core::chain::{ChainReader, ProviderChain};
use anyevm_core::executor::{DeploymentOutcome, Orchestrator};
use anyevm_core::fees::FeeEstimator;
use anyevm_core::planner::{DeploymentPlan, PlanBuilder};
use anyevm_core::registry::INFRA_CONTRACTS;
use anyevm_core::types::artifact::ContractArtifact;
use anyevm_core::types::config_wrapper::ConfigWrapper;
use anyevm_core::types::metadata::ExtendedDeployMetadata;
use anyevm_core::types::request::DeploymentRequest;
use anyevm_core::utils::abi::{parse_arg, parse_args};
use anyevm_core::utils::create2::CREATE2_FACTORY_ADDRESS;
use anyevm_core::{DeployError, predict_implementation_address};
use clap::{Args, Parser, Subcommand};
use eyre::{Result, eyre};
use log::info;
use std::env;
use std::fs;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long = "config", short = 'c', global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ContractArgs {
    /// Path to the compiled artifact JSON (Foundry or Hardhat)
    #[arg(long = "artifact", short = 'a')]
    artifact: String,

    /// Path to the publish metadata JSON. Without it the contract deploys directly.
    #[arg(long = "metadata", short = 'm')]
    metadata: Option<String>,

    /// Constructor argument as name=value, repeatable
    #[arg(long = "arg")]
    constructor_args: Vec<String>,

    /// Positional initializer (or custom factory) argument, repeatable
    #[arg(long = "init-arg")]
    initializer_args: Vec<String>,

    /// Fixed proxy salt
    #[arg(long = "salt")]
    salt: Option<String>,

    /// Skip every factory path and deploy with a plain CREATE
    #[arg(long = "direct")]
    direct: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a deployment would send, without sending anything
    Plan {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,

        /// Address the plan is built for
        #[arg(long = "from")]
        from: Address,

        #[command(flatten)]
        contract: ContractArgs,
    },
    /// Plan, confirm and execute a deployment
    Deploy {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,

        #[command(flatten)]
        contract: ContractArgs,

        /// Skip the confirmation prompt
        #[arg(long = "yes", short = 'y')]
        yes: bool,

        /// Use Trezor hardware wallet
        #[arg(long = "trezor", short = 't', conflicts_with = "ledger")]
        trezor: bool,

        /// Use Ledger hardware wallet
        #[arg(long = "ledger", short = 'l', conflicts_with = "trezor")]
        ledger: bool,
    },
    /// Print the chain-independent implementation address of a contract
    Predict {
        /// Path to the compiled artifact JSON
        #[arg(long = "artifact", short = 'a')]
        artifact: String,

        /// Constructor argument as name=value, repeatable
        #[arg(long = "arg")]
        constructor_args: Vec<String>,
    },
    /// List the infrastructure contracts, with their status on a network if given
    Infra {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: Option<u64>,
    },
    /// Print the fee estimate the deployer would use on a network
    Fees {
        /// Network ID
        #[arg(long = "network", short = 'n')]
        network_id: u64,
    },
}

enum SignerType {
    PrivateKey,
    Trezor,
    Ledger,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    // Also loads .env, which DEPLOYER_PRIVATE_KEY may come from.
    let config = ConfigWrapper::from_file(cli.config.as_deref())?;

    match &cli.command {
        Commands::Plan {
            network_id,
            from,
            contract,
        } => {
            let request = build_request(contract, *network_id)?;
            let deploy_config = config.deploy_config(*network_id)?;
            let chain = read_only_chain(&config, *network_id, *from).await?;

            let plan = PlanBuilder::new(&chain, *from, &deploy_config)
                .build(&request)
                .await?;
            print_plan_summary(&plan)?;
        }
        Commands::Deploy {
            network_id,
            contract,
            yes,
            trezor,
            ledger,
        } => {
            let signer_type = match (*trezor, *ledger) {
                (true, false) => SignerType::Trezor,
                (false, true) => SignerType::Ledger,
                _ => SignerType::PrivateKey,
            };
            let request = build_request(contract, *network_id)?;
            let deploy_config = config.deploy_config(*network_id)?;
            let rpc_url = config.get_rpc_url(*network_id)?;
            let (wallet, signer) = build_wallet(signer_type, *network_id).await?;

            let provider = ProviderBuilder::new()
                .wallet(wallet)
                .on_http(rpc_url.parse()?);
            let chain = ProviderChain::new(provider, signer, deploy_config.receipt_timeout);

            let plan = PlanBuilder::new(&chain, signer, &deploy_config)
                .build(&request)
                .await?;
            print_plan_summary(&plan)?;

            if !*yes && !prompt_user_confirmation("Would you like to send these transactions?")? {
                println!("Aborted, nothing was sent.");
                return Ok(());
            }

            match Orchestrator::new(&chain, &deploy_config).execute(&plan).await {
                Ok(outcome) => {
                    let explorer = config.get_block_explorer_url(*network_id).ok();
                    print_outcome_summary(&outcome, explorer.as_deref())?;
                }
                Err(e) => {
                    if e.downcast_ref::<DeployError>()
                        .is_some_and(DeployError::is_retryable)
                    {
                        println!("\nDeployment can be retried as is: {}", e);
                    }
                    return Err(e);
                }
            }
        }
        Commands::Predict {
            artifact,
            constructor_args,
        } => {
            let artifact = ContractArtifact::from_file(artifact)?;
            let mut request =
                DeploymentRequest::new(artifact, ExtendedDeployMetadata::default(), 0);
            add_constructor_args(&mut request, constructor_args)?;

            let address = predict_implementation_address(&request)?;
            println!("\n# {}", request.artifact.name);
            println!("\n## Implementation");
            println!("`{}`", address);
            println!("\n## Factory");
            println!("`{}`", CREATE2_FACTORY_ADDRESS);
        }
        Commands::Infra { network_id } => {
            let chain = match network_id {
                Some(id) => Some(read_only_chain(&config, *id, Address::ZERO).await?),
                None => None,
            };

            println!("\n# Infrastructure");
            println!("\n| Contract | Address | Deployed |");
            println!("|---|---|---|");
            for contract in INFRA_CONTRACTS.iter() {
                let deployed = match &chain {
                    Some(chain) => {
                        if chain.is_deployed(contract.predicted_address).await? {
                            "yes"
                        } else {
                            "no"
                        }
                    }
                    None => "-",
                };
                println!(
                    "| {} | `{}` | {} |",
                    contract.name, contract.predicted_address, deployed
                );
            }
        }
        Commands::Fees { network_id } => {
            let deploy_config = config.deploy_config(*network_id)?;
            let chain = read_only_chain(&config, *network_id, Address::ZERO).await?;
            let estimate = FeeEstimator::new(deploy_config.fees).estimate(&chain).await?;

            println!("\n# Fees (Network: {})", network_id);
            println!("```json");
            println!("{}", serde_json::to_string_pretty(&estimate)?);
            println!("```");
        }
    }

    Ok(())
}

fn build_request(contract: &ContractArgs, network_id: u64) -> Result<DeploymentRequest> {
    let artifact = ContractArtifact::from_file(&contract.artifact)?;
    let metadata = match &contract.metadata {
        Some(path) => serde_json::from_str::<ExtendedDeployMetadata>(&fs::read_to_string(path)?)?,
        None => ExtendedDeployMetadata::default(),
    };

    let mut request = DeploymentRequest::new(artifact, metadata, network_id);
    add_constructor_args(&mut request, &contract.constructor_args)?;

    if !contract.initializer_args.is_empty() {
        let types = request.initializer_types(contract.initializer_args.len())?;
        request.initializer_args = parse_args(&types, &contract.initializer_args)?;
    }
    request.proxy_salt = contract.salt.clone();
    request.force_direct_deploy = contract.direct;
    Ok(request)
}

fn add_constructor_args(request: &mut DeploymentRequest, args: &[String]) -> Result<()> {
    let params = request.artifact.constructor_params()?;
    for arg in args {
        let (name, value) = arg
            .split_once('=')
            .ok_or_else(|| eyre!("constructor argument {} is not name=value", arg))?;
        let param = params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| eyre!("{} has no constructor parameter {}", request.artifact.name, name))?;
        let value = parse_arg(&param.ty.sol_type_name(), value)?;
        request.constructor_args.insert(name.to_string(), value);
    }
    Ok(())
}

async fn read_only_chain(
    config: &ConfigWrapper,
    network_id: u64,
    from: Address,
) -> Result<ProviderChain<impl alloy::providers::Provider + Clone + Send + Sync + 'static>> {
    let rpc_url = config.get_rpc_url(network_id)?;
    let provider = ProviderBuilder::new().on_http(rpc_url.parse()?);
    let chain = ProviderChain::new(provider, from, config.deploy_config(network_id)?.receipt_timeout);

    let remote = chain.chain_id().await?;
    if remote != network_id {
        return Err(eyre!(
            "RPC for network {} reports chain id {}",
            network_id,
            remote
        ));
    }
    Ok(chain)
}

async fn build_wallet(signer_type: SignerType, chain_id: u64) -> Result<(EthereumWallet, Address)> {
    match signer_type {
        SignerType::PrivateKey => {
            let key = env::var("DEPLOYER_PRIVATE_KEY")
                .map_err(|_| eyre!("DEPLOYER_PRIVATE_KEY not set, or pass --trezor / --ledger"))?;
            let signer: PrivateKeySigner = key.parse()?;
            let address = signer.address();
            Ok((EthereumWallet::from(signer), address))
        }
        SignerType::Trezor => {
            let signer = TrezorSigner::new(TrezorHDPath::TrezorLive(0), Some(chain_id)).await?;
            let address = alloy::signers::Signer::address(&signer);
            Ok((EthereumWallet::from(signer), address))
        }
        SignerType::Ledger => {
            let signer = LedgerSigner::new(HDPath::LedgerLive(0), Some(chain_id)).await?;
            let address = alloy::signers::Signer::address(&signer);
            Ok((EthereumWallet::from(signer), address))
        }
    }
}

// Helper function to prompt user for confirmation
fn prompt_user_confirmation(message: &str) -> Result<bool> {
    println!("\n{} (y/n)", message);
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase() == "y")
}

fn print_plan_summary(plan: &DeploymentPlan) -> Result<()> {
    println!("\n# {} deployment (Network: {})", plan.strategy, plan.chain_id);
    println!("\n## Deployer");
    println!("`{}`", plan.deployer);

    if let Some(implementation) = plan.implementation {
        println!("\n## Implementation");
        println!("`{}`", implementation);
    }
    if let Some(factory) = plan.factory {
        println!("\n## Factory");
        println!("`{}`", factory);
    }

    println!("\n## Groups");
    for (i, group) in plan.preview().iter().enumerate() {
        let batch = group
            .batch
            .map(|b| format!(" (batch {})", b))
            .unwrap_or_default();
        println!("{}. {}{}", i + 1, group.contract_type, batch);
        for address in &group.addresses {
            println!("   - `{}`", address);
        }
    }

    println!("\n## Actions");
    println!("```json");
    println!("{}", serde_json::to_string_pretty(&plan.describe())?);
    println!("```");

    Ok(())
}

fn print_outcome_summary(outcome: &DeploymentOutcome, explorer: Option<&str>) -> Result<()> {
    info!("Deployment history: {:?}", outcome.history);

    println!("\n# Deployment Summary");
    println!("\n## Address");
    println!("`{}`", outcome.address);
    if outcome.already_deployed {
        println!("\nAlready deployed, nothing was sent for it.");
    }

    println!("\n## Transactions");
    for tx_hash in &outcome.tx_hashes {
        match explorer {
            Some(url) => println!("- [{}]({}/tx/{})", tx_hash, url, tx_hash),
            None => println!("- `{}`", tx_hash),
        }
    }

    println!("\n## Outcome");
    println!("```json");
    println!("{}", serde_json::to_string_pretty(outcome)?);
    println!("```");

    Ok(())
}
