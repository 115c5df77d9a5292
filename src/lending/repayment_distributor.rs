//! Repayment Distributor - pro-rata settlement of loan escrows
//!
//! Holds the funds a loan settles with, whether a full repayment or
//! liquidation proceeds, and lets each lender claim the share matching their
//! funded contribution. Claims are idempotent and rounding dust stays in the
//! escrow.

use super::errors::ProtocolError;
use super::events::*;
use super::marketplace::{LoanMarketplaceContractRef, LoanStatus};
use super::price_oracle::{AssetKind, PriceOracleContractRef};
use crate::math::{LoanMath, SafeMath};
use crate::token::Cep18TokenContractRef;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

/// Repayment Distributor contract
#[odra::module]
pub struct RepaymentDistributor {
    /// Escrow balance per loan
    escrow_totals: Mapping<u64, U256>,

    /// Asset each escrow is denominated in
    escrow_assets: Mapping<u64, String>,

    /// Amount already paid out per loan and lender
    claimed: Mapping<(u64, Address), U256>,

    /// Native value received per loan, for reconciliation
    native_funded: Mapping<u64, U512>,

    /// Price oracle address
    price_oracle: Var<Address>,

    /// Marketplace that records deposits and lender contributions
    marketplace: Var<Address>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl RepaymentDistributor {
    /// Initialize the distributor
    pub fn init(&mut self, price_oracle: Address) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.price_oracle.set(price_oracle);
    }

    /// Set the marketplace address (admin only)
    pub fn set_marketplace(&mut self, marketplace: Address) {
        self.only_admin();
        self.marketplace.set(marketplace);
    }

    // ========================================
    // Escrow Funding
    // ========================================

    /// Accept attached native value as escrow for a loan
    ///
    /// Pure value transfer into the contract purse. The ledger entry is
    /// recorded separately through `deposit_escrow`.
    #[odra(payable)]
    pub fn fund_escrow(&mut self, loan_id: u64) {
        let attached = self.env().attached_value();
        let received = self.native_funded.get(&loan_id).unwrap_or_default();
        self.native_funded.set(&loan_id, received + attached);
    }

    /// Record an escrow deposit for a loan (marketplace only)
    ///
    /// The value itself has already reached this contract, either as a
    /// token transfer or through `fund_escrow`.
    pub fn deposit_escrow(&mut self, loan_id: u64, asset: String, amount: U256) {
        self.only_marketplace();
        if amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        self.escrow_assets.set(&loan_id, asset.clone());
        let total = self.escrow_totals.get(&loan_id).unwrap_or_default();
        let total_escrow = SafeMath::add(total, amount).unwrap_or_revert(&self.env());
        self.escrow_totals.set(&loan_id, total_escrow);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(EscrowDeposited {
            loan_id,
            asset,
            amount,
            total_escrow,
            timestamp,
        });
    }

    // ========================================
    // Claims
    // ========================================

    /// Claim the caller's share of a settled loan's escrow
    ///
    /// Pays out the difference between the caller's pro-rata entitlement and
    /// what they have already claimed. A repeat claim pays nothing and
    /// returns zero.
    pub fn claim_repayments(&mut self, loan_id: u64) -> U256 {
        let caller = self.env().caller();
        let marketplace = self
            .marketplace
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let marketplace_ref = LoanMarketplaceContractRef::new(self.env(), marketplace);

        let loan = marketplace_ref
            .get_loan_request(loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotFound);
        if loan.status != LoanStatus::Repaid && loan.status != LoanStatus::Defaulted {
            self.env().revert(ProtocolError::LoanNotSettled);
        }

        let contribution = marketplace_ref.contribution_of(loan_id, caller);
        if contribution.is_zero() {
            self.env().revert(ProtocolError::Unauthorized);
        }

        let escrow = self.escrow_totals.get(&loan_id).unwrap_or_default();
        let entitlement = LoanMath::pro_rata_share(escrow, contribution, loan.funded_amount)
            .unwrap_or_revert(&self.env());
        let already_claimed = self.claimed.get(&(loan_id, caller)).unwrap_or_default();
        let payout = SafeMath::sub(entitlement, already_claimed).unwrap_or_revert(&self.env());

        // Record before paying
        self.claimed.set(&(loan_id, caller), entitlement);

        if !payout.is_zero() {
            let asset = self
                .escrow_assets
                .get(&loan_id)
                .unwrap_or_revert_with(&self.env(), ProtocolError::LoanNotSettled);
            self.pay_out(&asset, caller, payout);

            let timestamp = self.env().get_block_time();
            self.env().emit_event(RepaymentClaimed {
                loan_id,
                lender: caller,
                amount: payout,
                timestamp,
            });
        }

        payout
    }

    // ========================================
    // Views
    // ========================================

    /// Escrow balance recorded for a loan
    pub fn escrow_of(&self, loan_id: u64) -> U256 {
        self.escrow_totals.get(&loan_id).unwrap_or_default()
    }

    /// Asset a loan's escrow is denominated in
    pub fn escrow_asset_of(&self, loan_id: u64) -> Option<String> {
        self.escrow_assets.get(&loan_id)
    }

    /// Amount a lender has already claimed for a loan
    pub fn claimed_of(&self, loan_id: u64, lender: Address) -> U256 {
        self.claimed.get(&(loan_id, lender)).unwrap_or_default()
    }

    /// Amount a lender could claim right now, zero when the loan is not
    /// settled or the lender did not contribute
    pub fn claimable_of(&self, loan_id: u64, lender: Address) -> U256 {
        let marketplace = self
            .marketplace
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let marketplace_ref = LoanMarketplaceContractRef::new(self.env(), marketplace);

        let loan = match marketplace_ref.get_loan_request(loan_id) {
            Some(loan) => loan,
            None => return U256::zero(),
        };
        if loan.status != LoanStatus::Repaid && loan.status != LoanStatus::Defaulted {
            return U256::zero();
        }

        let contribution = marketplace_ref.contribution_of(loan_id, lender);
        if contribution.is_zero() {
            return U256::zero();
        }

        let escrow = self.escrow_totals.get(&loan_id).unwrap_or_default();
        let entitlement = LoanMath::pro_rata_share(escrow, contribution, loan.funded_amount)
            .unwrap_or_revert(&self.env());
        let already_claimed = self.claimed.get(&(loan_id, lender)).unwrap_or_default();
        entitlement.saturating_sub(already_claimed)
    }

    /// Native value received for a loan through `fund_escrow`
    pub fn native_funded_of(&self, loan_id: u64) -> U512 {
        self.native_funded.get(&loan_id).unwrap_or_default()
    }

    // ========================================
    // Internals
    // ========================================

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

    fn only_marketplace(&self) {
        let caller = self.env().caller();
        let marketplace = self
            .marketplace
            .get_or_revert_with(ProtocolError::Unauthorized);
        if caller != marketplace {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
