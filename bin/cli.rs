//! CLI tool for deploying and interacting with the theta vault contracts.

use odra::casper_types::U256;
use odra::prelude::Addressable;
use odra::host::HostEnv;
use odra::schema::casper_contract_schema::NamedCLType;
use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt,
    OdraCli,
};
use theta_vault_contracts::auction::settlement_house::SettlementHouse;
use theta_vault_contracts::lifecycle::theta_vault::ThetaVault;
use theta_vault_contracts::oracle::price_oracle::PriceOracle;
use theta_vault_contracts::pool::collateral_pool::CollateralPool;
use theta_vault_contracts::token::FungibleToken;
use theta_vault_contracts::vault::collateral_vault::CollateralVault;

/// Deploys the price oracle.
pub struct OracleDeployScript;

impl DeployScript for OracleDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use odra::host::NoArgs;

        let _oracle = PriceOracle::load_or_deploy(
            &env,
            NoArgs,
            container,
            300_000_000_000 // Gas limit for oracle deployment
        )?;

        Ok(())
    }
}

/// Deploys the settlement house.
/// Requires the oracle to be deployed first.
pub struct SettlementHouseDeployScript;

impl DeployScript for SettlementHouseDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use theta_vault_contracts::auction::settlement_house::SettlementHouseInitArgs;

        let oracle = container.contract_ref::<PriceOracle>(env)?;
        let oracle_address = oracle.address().clone();

        let _house = SettlementHouse::load_or_deploy(
            &env,
            SettlementHouseInitArgs {
                oracle: oracle_address,
                fee_numerator: U256::from(5u64),
            },
            container,
            500_000_000_000 // Gas limit for settlement house deployment
        )?;

        Ok(())
    }
}

/// Deploys an uninitialized collateral vault and theta vault pair.
/// Both are wired up afterwards through their initialize entrypoints.
pub struct VaultDeployScript;

impl DeployScript for VaultDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use odra::host::NoArgs;

        OracleDeployScript.deploy(env, container)?;
        SettlementHouseDeployScript.deploy(env, container)?;

        let _collateral_vault = CollateralVault::load_or_deploy(
            &env,
            NoArgs,
            container,
            500_000_000_000 // Gas limit for collateral vault deployment
        )?;

        let _theta_vault = ThetaVault::load_or_deploy(
            &env,
            NoArgs,
            container,
            500_000_000_000 // Gas limit for theta vault deployment
        )?;

        Ok(())
    }
}

/// Scenario to commit the next option and close the expired one.
pub struct CommitAndCloseScenario;

impl Scenario for CommitAndCloseScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        _args: Args
    ) -> Result<(), Error> {
        let mut theta_vault = container.contract_ref::<ThetaVault>(env)?;

        env.set_gas(300_000_000_000);
        theta_vault.try_commit_and_close()?;

        println!("Next option committed!");
        Ok(())
    }
}

impl ScenarioMetadata for CommitAndCloseScenario {
    const NAME: &'static str = "commit-and-close";
    const DESCRIPTION: &'static str = "Commits next week's option and closes the expired position";
}

/// Scenario to roll the vault into the committed option.
pub struct RollScenario;

impl Scenario for RollScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        _args: Args
    ) -> Result<(), Error> {
        let mut theta_vault = container.contract_ref::<ThetaVault>(env)?;

        env.set_gas(500_000_000_000);
        theta_vault.try_roll_to_next_option()?;

        println!("Rolled into the next option!");
        Ok(())
    }
}

impl ScenarioMetadata for RollScenario {
    const NAME: &'static str = "roll-to-next-option";
    const DESCRIPTION: &'static str = "Rolls every collateral vault into the committed option";
}

/// Scenario to deposit into a collateral vault.
pub struct DepositScenario;

impl Scenario for DepositScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![
            CommandArg::new(
                "amount",
                "Pool token amount to deposit",
                NamedCLType::U256,
            ),
        ]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut collateral_vault = container.contract_ref::<CollateralVault>(env)?;
        let amount = args.get_single::<U256>("amount")?;

        env.set_gas(300_000_000_000);
        collateral_vault.try_deposit(amount)?;

        println!("Deposit pending for the current round!");
        Ok(())
    }
}

impl ScenarioMetadata for DepositScenario {
    const NAME: &'static str = "deposit";
    const DESCRIPTION: &'static str = "Deposits pool tokens into the collateral vault";
}

/// Main function to run the CLI tool.
pub fn main() {
    OdraCli::new()
        .about("CLI tool for the theta vault contracts")
        // Deploy scripts
        .deploy(OracleDeployScript)
        .deploy(SettlementHouseDeployScript)
        .deploy(VaultDeployScript)
        // Contract references
        .contract::<PriceOracle>()
        .contract::<SettlementHouse>()
        .contract::<CollateralPool>()
        .contract::<CollateralVault>()
        .contract::<ThetaVault>()
        .contract::<FungibleToken>()
        // Scenarios
        .scenario(CommitAndCloseScenario)
        .scenario(RollScenario)
        .scenario(DepositScenario)
        .build()
        .run();
}
