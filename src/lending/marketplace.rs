//! Loan Marketplace - Main contract for the peer-to-peer loan lifecycle
//!
//! Coordinates the protocol end to end:
//! - Loan requests and their collateral lock
//! - Multi-lender funding and activation
//! - Repayment into the settlement escrow
//! - Default checks and collateral liquidation
//! - Credit score updates at settlement

use super::collateral_vault::CollateralVaultContractRef;
use super::credit_score::CreditScoreEngineContractRef;
use super::errors::ProtocolError;
use super::events::*;
use super::identity_gate::IdentityGateContractRef;
use super::price_oracle::{AssetKind, PriceOracleContractRef};
use super::repayment_distributor::RepaymentDistributorContractRef;
use crate::math::{LoanMath, SafeMath};
use crate::token::Cep18TokenContractRef;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

/// Lifecycle states of a loan
#[odra::odra_type]
pub enum LoanStatus {
    /// Accepting lender contributions
    Open,
    /// Fully funded, principal paid out, term running
    Active,
    /// Repaid in full, escrow claimable by lenders
    Repaid,
    /// Defaulted, liquidation proceeds claimable by lenders
    Defaulted,
    /// Cancelled by the borrower before activation
    Cancelled,
}

/// Marketplace limits and risk parameters
#[odra::odra_type]
pub struct ProtocolConfig {
    /// Minimum loan principal
    pub min_loan_amount: U256,
    /// Maximum loan principal
    pub max_loan_amount: U256,
    /// Collateral ratio a new loan must meet, in basis points
    pub min_collateral_ratio_bps: u32,
    /// Health factor below which an active loan can be defaulted,
    /// in basis points
    pub liquidation_threshold_bps: u32,
}

impl ProtocolConfig {
    /// Check internal consistency of the configuration
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.min_loan_amount > self.max_loan_amount {
            return Err(ProtocolError::InvalidConfiguration);
        }
        if self.min_collateral_ratio_bps < 10_000 {
            return Err(ProtocolError::InvalidConfiguration);
        }
        if self.liquidation_threshold_bps == 0
            || self.liquidation_threshold_bps > self.min_collateral_ratio_bps
        {
            return Err(ProtocolError::InvalidConfiguration);
        }
        Ok(())
    }
}

/// A loan request and its lifecycle state
#[odra::odra_type]
pub struct LoanRequest {
    /// Loan identifier
    pub id: u64,
    /// Borrower that opened the request
    pub borrower: Address,
    /// Requested principal
    pub principal: U256,
    /// Asset the principal is denominated in
    pub loan_asset: String,
    /// Interest over the full term, in basis points
    pub interest_rate_bps: u32,
    /// Term length in milliseconds
    pub duration_ms: u64,
    /// Collateral amount locked in the vault
    pub collateral_amount: U256,
    /// Collateral asset
    pub collateral_asset: String,
    /// Total contributed by lenders so far
    pub funded_amount: U256,
    /// Current lifecycle state
    pub status: LoanStatus,
    /// Timestamp of creation
    pub created_at: u64,
    /// Timestamp of activation, set when fully funded
    pub activated_at: Option<u64>,
}

/// Loan Marketplace contract
#[odra::module]
pub struct LoanMarketplace {
    /// Loans by id
    loans: Mapping<u64, LoanRequest>,
    /// Contribution per loan and lender
    contributions: Mapping<(u64, Address), U256>,
    /// Lender addresses per loan, indexed for iteration
    lenders: Mapping<(u64, u32), Address>,
    /// Number of distinct lenders per loan
    lender_counts: Mapping<u64, u32>,
    /// Number of loans ever created
    loan_count: Var<u64>,
    /// Collateral vault address
    collateral_vault: Var<Address>,
    /// Identity gate address
    identity_gate: Var<Address>,
    /// Credit score engine address
    credit_engine: Var<Address>,
    /// Price oracle address
    price_oracle: Var<Address>,
    /// Repayment distributor address
    distributor: Var<Address>,
    /// Marketplace limits and risk parameters
    config: Var<ProtocolConfig>,
    /// Admin address
    admin: Var<Address>,
    /// Paused state
    paused: Var<bool>,
}

#[odra::module]
impl LoanMarketplace {
    /// Initialize the marketplace
    pub fn init(
        &mut self,
        collateral_vault: Address,
        identity_gate: Address,
        credit_engine: Address,
        price_oracle: Address,
        distributor: Address,
        config: ProtocolConfig,
    ) {
        let caller = self.env().caller();
        config.validate().unwrap_or_revert(&self.env());

        self.collateral_vault.set(collateral_vault);
        self.identity_gate.set(identity_gate);
        self.credit_engine.set(credit_engine);
        self.price_oracle.set(price_oracle);
        self.distributor.set(distributor);
        self.config.set(config);

        self.loan_count.set(0);
        self.admin.set(caller);
        self.paused.set(false);
    }

    // ========================================
    // Loan Lifecycle
    // ========================================

    /// Open a loan request and lock its collateral. Returns the loan id.
    ///
    /// The borrower must hold a verified identity. Native collateral must be
    /// attached to the call; token collateral is pulled by the vault, which
    /// the borrower must have approved.
    #[odra(payable)]
    pub fn create_loan_request(
        &mut self,
        principal: U256,
        loan_asset: String,
        interest_rate_bps: u32,
        duration_ms: u64,
        collateral_amount: U256,
        collateral_asset: String,
    ) -> u64 {
        self.ensure_not_paused();
        let caller = self.env().caller();

        // Sybil gate
        let gate = self
            .identity_gate
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        if !IdentityGateContractRef::new(self.env(), gate).is_verified(caller) {
            self.env().revert(ProtocolError::IdentityNotVerified);
        }

        let config = self
            .config
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        if principal < config.min_loan_amount || principal > config.max_loan_amount {
            self.env().revert(ProtocolError::InvalidAmount);
        }
        if duration_ms == 0 {
            self.env().revert(ProtocolError::InvalidDuration);
        }
        if collateral_amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        // Both assets must be registered
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle_ref = PriceOracleContractRef::new(self.env(), oracle);
        if !oracle_ref.is_supported(loan_asset.clone()) {
            self.env().revert(ProtocolError::TokenNotSupported);
        }
        let collateral_info = oracle_ref.asset_info(collateral_asset.clone());

        // Creation-time collateralization check at current prices
        let vault = self
            .collateral_vault
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let ratio = CollateralVaultContractRef::new(self.env(), vault).collateral_ratio_bps(
            collateral_asset.clone(),
            collateral_amount,
            loan_asset.clone(),
            principal,
        );
        if ratio < config.min_collateral_ratio_bps {
            self.env().revert(ProtocolError::InsufficientCollateralRatio);
        }

        let loan_id = self.loan_count.get_or_default() + 1;
        self.loan_count.set(loan_id);

        let timestamp = self.env().get_block_time();
        self.loans.set(
            &loan_id,
            LoanRequest {
                id: loan_id,
                borrower: caller,
                principal,
                loan_asset: loan_asset.clone(),
                interest_rate_bps,
                duration_ms,
                collateral_amount,
                collateral_asset: collateral_asset.clone(),
                funded_amount: U256::zero(),
                status: LoanStatus::Open,
                created_at: timestamp,
                activated_at: None,
            },
        );

        // Move the collateral into the vault
        match collateral_info.kind {
            AssetKind::Native => {
                let attached = self.env().attached_value();
                if attached != U512::from(collateral_amount.as_u128()) {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
                CollateralVaultContractRef::new(self.env(), vault)
                    .with_tokens(attached)
                    .lock_collateral(loan_id, caller, collateral_asset.clone(), collateral_amount);
            }
            AssetKind::Token => {
                if !self.env().attached_value().is_zero() {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
                CollateralVaultContractRef::new(self.env(), vault).lock_collateral(
                    loan_id,
                    caller,
                    collateral_asset.clone(),
                    collateral_amount,
                );
            }
        }

        self.env().emit_event(LoanRequested {
            loan_id,
            borrower: caller,
            principal,
            loan_asset,
            interest_rate_bps,
            duration_ms,
            collateral_amount,
            collateral_asset,
            timestamp,
        });

        loan_id
    }

    /// Contribute funding to an open loan request
    ///
    /// A contribution that would push the funded total past the principal is
    /// rejected outright. The contribution that reaches the principal
    /// exactly activates the loan and pays the borrower.
    #[odra(payable)]
    pub fn fund_loan_request(&mut self, loan_id: u64, amount: U256) {
        self.ensure_not_paused();
        let caller = self.env().caller();

        let mut loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Open {
            self.env().revert(ProtocolError::LoanNotOpen);
        }
        if amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }
        let funded_amount = SafeMath::add(loan.funded_amount, amount).unwrap_or_revert(&self.env());
        if funded_amount > loan.principal {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        // Collect the contribution
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(loan.loan_asset.clone());
        match info.kind {
            AssetKind::Native => {
                let attached = self.env().attached_value();
                if attached != U512::from(amount.as_u128()) {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
            }
            AssetKind::Token => {
                if !self.env().attached_value().is_zero() {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let self_address = self.env().self_address();
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer_from(caller, self_address, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        // Record the lender on first contribution
        let existing = self.contributions.get(&(loan_id, caller)).unwrap_or_default();
        if existing.is_zero() {
            let index = self.lender_counts.get(&loan_id).unwrap_or_default();
            self.lenders.set(&(loan_id, index), caller);
            self.lender_counts.set(&loan_id, index + 1);
        }
        let contribution = SafeMath::add(existing, amount).unwrap_or_revert(&self.env());
        self.contributions.set(&(loan_id, caller), contribution);

        loan.funded_amount = funded_amount;
        let timestamp = self.env().get_block_time();

        if funded_amount == loan.principal {
            loan.status = LoanStatus::Active;
            loan.activated_at = Some(timestamp);
            self.loans.set(&loan_id, loan.clone());

            // Pay the principal out to the borrower
            self.pay_out(&loan.loan_asset, loan.borrower, loan.principal);

            self.env().emit_event(LoanFunded {
                loan_id,
                lender: caller,
                amount,
                funded_amount,
                timestamp,
            });
            self.env().emit_event(LoanActivated {
                loan_id,
                borrower: loan.borrower,
                principal: loan.principal,
                timestamp,
            });
        } else {
            self.loans.set(&loan_id, loan);
            self.env().emit_event(LoanFunded {
                loan_id,
                lender: caller,
                amount,
                funded_amount,
                timestamp,
            });
        }
    }

    /// Cancel an open loan request (borrower only)
    ///
    /// Refunds every lender their full contribution and releases the
    /// collateral back to the borrower.
    pub fn cancel_loan_request(&mut self, loan_id: u64) {
        self.ensure_not_paused();
        let caller = self.env().caller();

        let mut loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Open {
            self.env().revert(ProtocolError::LoanNotOpen);
        }
        if caller != loan.borrower {
            self.env().revert(ProtocolError::Unauthorized);
        }

        loan.status = LoanStatus::Cancelled;
        let refunded_total = loan.funded_amount;
        self.loans.set(&loan_id, loan.clone());

        // Refund every lender in full
        let count = self.lender_counts.get(&loan_id).unwrap_or_default();
        for index in 0..count {
            if let Some(lender) = self.lenders.get(&(loan_id, index)) {
                let contribution = self.contributions.get(&(loan_id, lender)).unwrap_or_default();
                if !contribution.is_zero() {
                    self.pay_out(&loan.loan_asset, lender, contribution);
                }
            }
        }

        // Collateral goes back to the borrower
        let vault = self
            .collateral_vault
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        CollateralVaultContractRef::new(self.env(), vault)
            .release_collateral(loan_id, loan.borrower);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(LoanCancelled {
            loan_id,
            borrower: caller,
            refunded_total,
            timestamp,
        });
    }

    /// Repay an active loan in full (borrower only)
    ///
    /// `amount` must cover the principal plus interest accrued up to now.
    /// The whole submitted amount moves into the settlement escrow and the
    /// collateral returns to the borrower. Native repayment must be attached
    /// to the call; token repayment is pulled from the borrower, who must
    /// have approved this contract.
    #[odra(payable)]
    pub fn repay_loan(&mut self, loan_id: u64, amount: U256) {
        self.ensure_not_paused();
        let caller = self.env().caller();

        let mut loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Active {
            self.env().revert(ProtocolError::LoanNotActive);
        }
        if caller != loan.borrower {
            self.env().revert(ProtocolError::Unauthorized);
        }

        let activated_at = loan
            .activated_at
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotActive);
        let timestamp = self.env().get_block_time();
        let interest = LoanMath::accrued_interest(
            loan.principal,
            loan.interest_rate_bps,
            timestamp - activated_at,
            loan.duration_ms,
        )
        .unwrap_or_revert(&self.env());
        let total_due = SafeMath::add(loan.principal, interest).unwrap_or_revert(&self.env());
        if amount < total_due {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        loan.status = LoanStatus::Repaid;
        self.loans.set(&loan_id, loan.clone());

        // Move the full submitted amount into the settlement escrow
        let distributor = self
            .distributor
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(loan.loan_asset.clone());
        match info.kind {
            AssetKind::Native => {
                let attached = self.env().attached_value();
                if attached != U512::from(amount.as_u128()) {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
                RepaymentDistributorContractRef::new(self.env(), distributor)
                    .with_tokens(attached)
                    .fund_escrow(loan_id);
            }
            AssetKind::Token => {
                if !self.env().attached_value().is_zero() {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer_from(caller, distributor, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }
        RepaymentDistributorContractRef::new(self.env(), distributor).deposit_escrow(
            loan_id,
            loan.loan_asset.clone(),
            amount,
        );

        // Collateral goes back to the borrower
        let vault = self
            .collateral_vault
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        CollateralVaultContractRef::new(self.env(), vault)
            .release_collateral(loan_id, loan.borrower);

        // Reward the completion
        let credit = self
            .credit_engine
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        CreditScoreEngineContractRef::new(self.env(), credit).on_loan_completed(loan.borrower);

        self.env().emit_event(LoanRepaid {
            loan_id,
            borrower: caller,
            amount,
            interest,
            timestamp,
        });
    }

    /// Default an active loan that is past maturity or undercollateralized
    ///
    /// Callable by anyone. An expired loan defaults without consulting the
    /// oracle, so stale feeds cannot block it. Liquidation proceeds move
    /// into the settlement escrow and the borrower's score takes the
    /// penalty.
    pub fn check_default(&mut self, loan_id: u64) {
        self.ensure_not_paused();

        let mut loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status == LoanStatus::Defaulted {
            self.env().revert(ProtocolError::AlreadyDefaulted);
        }
        if loan.status != LoanStatus::Active {
            self.env().revert(ProtocolError::LoanNotActive);
        }

        let activated_at = loan
            .activated_at
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotActive);
        let timestamp = self.env().get_block_time();
        let maturity = activated_at.saturating_add(loan.duration_ms);
        let expired = timestamp > maturity;

        let eligible = if expired {
            true
        } else {
            let config = self
                .config
                .get_or_revert_with(ProtocolError::InvalidConfiguration);
            let health_factor = self.live_health_factor_bps(&loan, timestamp);
            health_factor < config.liquidation_threshold_bps
        };
        if !eligible {
            self.env().revert(ProtocolError::PositionHealthy);
        }

        loan.status = LoanStatus::Defaulted;
        self.loans.set(&loan_id, loan.clone());

        // Seize the collateral and settle its value in the loan asset
        let vault = self
            .collateral_vault
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let proceeds = CollateralVaultContractRef::new(self.env(), vault)
            .liquidate(loan_id, loan.loan_asset.clone());
        if !proceeds.is_zero() {
            let distributor = self
                .distributor
                .get_or_revert_with(ProtocolError::InvalidConfiguration);
            RepaymentDistributorContractRef::new(self.env(), distributor).deposit_escrow(
                loan_id,
                loan.loan_asset.clone(),
                proceeds,
            );
        }

        // Penalize the borrower, scaled by how far past due the loan ran
        let overdue_ms = timestamp.saturating_sub(maturity);
        let credit = self
            .credit_engine
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        CreditScoreEngineContractRef::new(self.env(), credit).on_loan_defaulted(
            loan.borrower,
            overdue_ms,
            loan.duration_ms,
        );

        self.env().emit_event(LoanDefaulted {
            loan_id,
            borrower: loan.borrower,
            proceeds,
            timestamp,
        });
    }

    // ========================================
    // View Functions
    // ========================================

    pub fn get_loan_request(&self, loan_id: u64) -> Option<LoanRequest> {
        self.loans.get(&loan_id)
    }

    pub fn contribution_of(&self, loan_id: u64, lender: Address) -> U256 {
        self.contributions.get(&(loan_id, lender)).unwrap_or_default()
    }

    /// Every lender that contributed to a loan
    pub fn lenders_of(&self, loan_id: u64) -> Vec<Address> {
        let count = self.lender_counts.get(&loan_id).unwrap_or_default();
        let mut result = Vec::new();
        for index in 0..count {
            if let Some(lender) = self.lenders.get(&(loan_id, index)) {
                result.push(lender);
            }
        }
        result
    }

    /// Interest accrued on an active loan up to now, zero otherwise
    pub fn accrued_interest(&self, loan_id: u64) -> U256 {
        let loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Active {
            return U256::zero();
        }
        let activated_at = loan
            .activated_at
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotActive);
        let timestamp = self.env().get_block_time();
        LoanMath::accrued_interest(
            loan.principal,
            loan.interest_rate_bps,
            timestamp - activated_at,
            loan.duration_ms,
        )
        .unwrap_or_revert(&self.env())
    }

    /// Amount settling the loan right now: principal plus live interest for
    /// an active loan, the principal for an open one, zero once settled
    pub fn total_due(&self, loan_id: u64) -> U256 {
        let loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        match loan.status {
            LoanStatus::Active => {
                SafeMath::add(loan.principal, self.accrued_interest(loan_id))
                    .unwrap_or_revert(&self.env())
            }
            LoanStatus::Open => loan.principal,
            _ => U256::zero(),
        }
    }

    /// Collateral value against outstanding debt for an active loan,
    /// in basis points
    pub fn health_factor_bps(&self, loan_id: u64) -> u32 {
        let loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Active {
            self.env().revert(ProtocolError::LoanNotActive);
        }
        let timestamp = self.env().get_block_time();
        self.live_health_factor_bps(&loan, timestamp)
    }

    /// USD value of the amount currently owed, at the live oracle price
    pub fn outstanding_value_usd(&self, loan_id: u64) -> U256 {
        let loan = self
            .loans
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        let due = self.total_due(loan_id);
        if due.is_zero() {
            return U256::zero();
        }
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        PriceOracleContractRef::new(self.env(), oracle).usd_value(loan.loan_asset, due)
    }

    pub fn loan_count(&self) -> u64 {
        self.loan_count.get_or_default()
    }

    pub fn get_config(&self) -> ProtocolConfig {
        self.config
            .get_or_revert_with(ProtocolError::InvalidConfiguration)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get_or_default()
    }

    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(ProtocolError::Unauthorized)
    }

    // ========================================
    // Admin Functions
    // ========================================

    /// Replace the marketplace configuration (admin only)
    pub fn update_config(&mut self, config: ProtocolConfig) {
        self.only_admin();
        config.validate().unwrap_or_revert(&self.env());
        self.config.set(config.clone());

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(ConfigUpdated {
            min_loan_amount: config.min_loan_amount,
            max_loan_amount: config.max_loan_amount,
            min_collateral_ratio_bps: config.min_collateral_ratio_bps,
            liquidation_threshold_bps: config.liquidation_threshold_bps,
            updated_by: admin,
        });
    }

    pub fn pause(&mut self) {
        self.only_admin();
        self.paused.set(true);

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        let timestamp = self.env().get_block_time();
        self.env().emit_event(ContractPaused {
            paused_by: admin,
            timestamp,
        });
    }

    pub fn unpause(&mut self) {
        self.only_admin();
        self.paused.set(false);

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        let timestamp = self.env().get_block_time();
        self.env().emit_event(ContractUnpaused {
            unpaused_by: admin,
            timestamp,
        });
    }

    // ========================================
    // Internals
    // ========================================

    fn live_health_factor_bps(&self, loan: &LoanRequest, timestamp: u64) -> u32 {
        let activated_at = loan
            .activated_at
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotActive);
        let interest = LoanMath::accrued_interest(
            loan.principal,
            loan.interest_rate_bps,
            timestamp - activated_at,
            loan.duration_ms,
        )
        .unwrap_or_revert(&self.env());
        let outstanding = SafeMath::add(loan.principal, interest).unwrap_or_revert(&self.env());

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let outstanding_usd = PriceOracleContractRef::new(self.env(), oracle)
            .usd_value(loan.loan_asset.clone(), outstanding);

        let vault = self
            .collateral_vault
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        CollateralVaultContractRef::new(self.env(), vault)
            .health_factor_bps(loan.id, outstanding_usd)
    }

    fn pay_out(&mut self, asset: &str, to: Address, amount: U256) {
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(String::from(asset));

        match info.kind {
            AssetKind::Native => {
                self.env()
                    .transfer_tokens(&to, &U512::from(amount.as_u128()));
            }
            AssetKind::Token => {
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer(to, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }

    fn ensure_not_paused(&self) {
        if self.paused.get_or_default() {
            self.env().revert(ProtocolError::ContractPaused);
        }
    }
}
