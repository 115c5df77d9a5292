//! CLI tool for deploying and interacting with the lending protocol contracts.

use odra::casper_types::U256;
use odra::host::HostEnv;
use odra::prelude::{Address, Addressable};
use odra::schema::casper_contract_schema::NamedCLType;
use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt,
    OdraCli,
};
use peerlend_contracts::lending::attestor::ProofAttestor;
use peerlend_contracts::lending::collateral_vault::CollateralVault;
use peerlend_contracts::lending::credit_score::CreditScoreEngine;
use peerlend_contracts::lending::identity_gate::IdentityGate;
use peerlend_contracts::lending::marketplace::LoanMarketplace;
use peerlend_contracts::lending::price_oracle::{AssetKind, PriceOracle};
use peerlend_contracts::lending::repayment_distributor::RepaymentDistributor;
use peerlend_contracts::lending::swap_desk::SwapDesk;
use peerlend_contracts::token::AssetToken;

/// Deploys the price oracle with the caller as publisher.
pub struct OracleDeployScript;

impl DeployScript for OracleDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use peerlend_contracts::lending::price_oracle::PriceOracleInitArgs;

        let caller = env.caller();
        let _oracle = PriceOracle::load_or_deploy(
            &env,
            PriceOracleInitArgs {
                publisher: caller,
                max_staleness_ms: 3_600_000, // One hour
            },
            container,
            400_000_000_000 // Gas limit for oracle deployment
        )?;

        Ok(())
    }
}

/// Deploys the identity layer (attestor + gate).
pub struct IdentityDeployScript;

impl DeployScript for IdentityDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use odra::host::NoArgs;
        use peerlend_contracts::lending::identity_gate::IdentityGateInitArgs;

        let attestor = ProofAttestor::load_or_deploy(
            &env,
            NoArgs,
            container,
            300_000_000_000
        )?;

        let _gate = IdentityGate::load_or_deploy(
            &env,
            IdentityGateInitArgs {
                verifier: attestor.address().clone(),
            },
            container,
            350_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys and wires the complete lending protocol.
/// Requires the oracle and identity layer to be deployed first.
pub struct ProtocolDeployScript;

impl DeployScript for ProtocolDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use odra::host::NoArgs;
        use peerlend_contracts::lending::collateral_vault::CollateralVaultInitArgs;
        use peerlend_contracts::lending::marketplace::{
            LoanMarketplaceInitArgs, ProtocolConfig,
        };
        use peerlend_contracts::lending::repayment_distributor::RepaymentDistributorInitArgs;
        use peerlend_contracts::lending::swap_desk::SwapDeskInitArgs;

        OracleDeployScript.deploy(env, container)?;
        IdentityDeployScript.deploy(env, container)?;

        let oracle = container.contract_ref::<PriceOracle>(env)?;
        let oracle_address = oracle.address().clone();
        let gate = container.contract_ref::<IdentityGate>(env)?;
        let gate_address = gate.address().clone();

        let mut credit = CreditScoreEngine::load_or_deploy(
            &env,
            NoArgs,
            container,
            350_000_000_000
        )?;

        let mut distributor = RepaymentDistributor::load_or_deploy(
            &env,
            RepaymentDistributorInitArgs {
                price_oracle: oracle_address,
            },
            container,
            400_000_000_000
        )?;

        let desk = SwapDesk::load_or_deploy(
            &env,
            SwapDeskInitArgs {
                price_oracle: oracle_address,
                proceeds_sink: distributor.address().clone(),
            },
            container,
            400_000_000_000
        )?;

        let mut vault = CollateralVault::load_or_deploy(
            &env,
            CollateralVaultInitArgs {
                price_oracle: oracle_address,
                swap_desk: desk.address().clone(),
                distributor: distributor.address().clone(),
            },
            container,
            450_000_000_000
        )?;

        let marketplace = LoanMarketplace::load_or_deploy(
            &env,
            LoanMarketplaceInitArgs {
                collateral_vault: vault.address().clone(),
                identity_gate: gate_address,
                credit_engine: credit.address().clone(),
                price_oracle: oracle_address,
                distributor: distributor.address().clone(),
                config: ProtocolConfig {
                    min_loan_amount: U256::from(1_000_000_000u64),
                    max_loan_amount: U256::from(1_000_000_000_000_000u64),
                    min_collateral_ratio_bps: 15_000,
                    liquidation_threshold_bps: 12_000,
                },
            },
            container,
            500_000_000_000 // Gas limit for marketplace deployment
        )?;

        // Point the custody and settlement contracts at the marketplace
        let marketplace_address = marketplace.address().clone();
        env.set_gas(5_000_000_000);
        vault.set_marketplace(marketplace_address);
        env.set_gas(5_000_000_000);
        distributor.set_marketplace(marketplace_address);
        env.set_gas(5_000_000_000);
        credit.set_marketplace(marketplace_address);

        Ok(())
    }
}

/// Scenario to register a CEP-18 token as a priceable asset.
pub struct RegisterTokenAssetScenario;

impl Scenario for RegisterTokenAssetScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "asset",
                "Symbolic identifier of the asset",
                NamedCLType::String,
            ),
            CommandArg::new(
                "token",
                "Address of the CEP-18 token contract",
                NamedCLType::Key,
            ),
            CommandArg::new(
                "decimals",
                "Decimal places of the token",
                NamedCLType::U8,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut oracle = container.contract_ref::<PriceOracle>(env)?;
        let asset = args.get_single::<String>("asset")?;
        let token = args.get_single::<Address>("token")?;
        let decimals = args.get_single::<u8>("decimals")?;

        env.set_gas(10_000_000_000);
        oracle.try_register_asset(asset.clone(), AssetKind::Token, Some(token), decimals)?;

        println!("Asset {} registered!", asset);
        Ok(())
    }
}

impl ScenarioMetadata for RegisterTokenAssetScenario {
    const NAME: &'static str = "register-token-asset";
    const DESCRIPTION: &'static str = "Registers a CEP-18 token in the price oracle";
}

/// Scenario to register the native asset.
pub struct RegisterNativeAssetScenario;

impl Scenario for RegisterNativeAssetScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "asset",
                "Symbolic identifier of the native asset",
                NamedCLType::String,
            ),
            CommandArg::new(
                "decimals",
                "Decimal places of the native asset",
                NamedCLType::U8,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut oracle = container.contract_ref::<PriceOracle>(env)?;
        let asset = args.get_single::<String>("asset")?;
        let decimals = args.get_single::<u8>("decimals")?;

        env.set_gas(10_000_000_000);
        oracle.try_register_asset(asset.clone(), AssetKind::Native, None, decimals)?;

        println!("Native asset {} registered!", asset);
        Ok(())
    }
}

impl ScenarioMetadata for RegisterNativeAssetScenario {
    const NAME: &'static str = "register-native-asset";
    const DESCRIPTION: &'static str = "Registers the chain's native asset in the price oracle";
}

/// Scenario to publish a USD price for a registered asset.
pub struct PublishPriceScenario;

impl Scenario for PublishPriceScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "asset",
                "Symbolic identifier of the asset",
                NamedCLType::String,
            ),
            CommandArg::new(
                "price",
                "USD price scaled by the feed decimals",
                NamedCLType::U64,
            ),
            CommandArg::new(
                "decimals",
                "Decimal places of the published price",
                NamedCLType::U8,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut oracle = container.contract_ref::<PriceOracle>(env)?;
        let asset = args.get_single::<String>("asset")?;
        let price = args.get_single::<u64>("price")?;
        let decimals = args.get_single::<u8>("decimals")?;

        env.set_gas(5_000_000_000);
        oracle.try_publish_price(asset.clone(), U256::from(price), decimals)?;

        println!("Price for {} published!", asset);
        Ok(())
    }
}

impl ScenarioMetadata for PublishPriceScenario {
    const NAME: &'static str = "publish-price";
    const DESCRIPTION: &'static str = "Publishes a USD price for a registered asset";
}

/// Scenario to probe a loan for default conditions.
pub struct CheckDefaultScenario;

impl Scenario for CheckDefaultScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![CommandArg::new(
            "loan_id",
            "Identifier of the loan to probe",
            NamedCLType::U64,
        )]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut marketplace = container.contract_ref::<LoanMarketplace>(env)?;
        let loan_id = args.get_single::<u64>("loan_id")?;

        env.set_gas(300_000_000_000);
        marketplace.try_check_default(loan_id)?;

        println!("Loan {} defaulted and collateral liquidated!", loan_id);
        Ok(())
    }
}

impl ScenarioMetadata for CheckDefaultScenario {
    const NAME: &'static str = "check-default";
    const DESCRIPTION: &'static str = "Defaults an expired or undercollateralized loan";
}

/// Main function to run the CLI tool.
pub fn main() {
    OdraCli::new()
        .about("CLI tool for the peer-to-peer lending protocol contracts")
        // Deploy scripts
        .deploy(OracleDeployScript)
        .deploy(IdentityDeployScript)
        .deploy(ProtocolDeployScript)
        // Contract references
        .contract::<PriceOracle>()
        .contract::<ProofAttestor>()
        .contract::<IdentityGate>()
        .contract::<CreditScoreEngine>()
        .contract::<SwapDesk>()
        .contract::<CollateralVault>()
        .contract::<RepaymentDistributor>()
        .contract::<LoanMarketplace>()
        .contract::<AssetToken>()
        // Scenarios
        .scenario(RegisterTokenAssetScenario)
        .scenario(RegisterNativeAssetScenario)
        .scenario(PublishPriceScenario)
        .scenario(CheckDefaultScenario)
        .build()
        .run();
}
