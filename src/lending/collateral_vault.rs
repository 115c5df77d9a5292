//! Collateral Vault - custody and valuation of loan collateral
//!
//! Holds the collateral backing each loan from creation until settlement.
//! The marketplace is the only caller able to lock, release, or liquidate a
//! position. Liquidation proceeds always end up at the repayment distributor,
//! converted through the swap desk when the collateral and loan assets
//! differ.

use super::errors::ProtocolError;
use super::events::*;
use super::price_oracle::{AssetKind, PriceOracleContractRef};
use super::swap_desk::{ProceedsSinkContractRef, SwapDeskContractRef};
use crate::math::LoanMath;
use crate::token::Cep18TokenContractRef;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

/// Collateral held for a single loan
#[odra::odra_type]
pub struct CollateralPosition {
    /// Loan the collateral backs
    pub loan_id: u64,
    /// Borrower that posted the collateral
    pub owner: Address,
    /// Collateral asset
    pub asset: String,
    /// Amount currently held, zero once released or liquidated
    pub amount: U256,
}

/// Collateral Vault contract
#[odra::module]
pub struct CollateralVault {
    /// Positions by loan id
    positions: Mapping<u64, CollateralPosition>,

    /// Price oracle address
    price_oracle: Var<Address>,

    /// Swap desk used to convert seized collateral
    swap_desk: Var<Address>,

    /// Repayment distributor receiving liquidation proceeds
    distributor: Var<Address>,

    /// Marketplace allowed to move collateral
    marketplace: Var<Address>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl CollateralVault {
    /// Initialize the vault with its collaborator addresses
    pub fn init(&mut self, price_oracle: Address, swap_desk: Address, distributor: Address) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.price_oracle.set(price_oracle);
        self.swap_desk.set(swap_desk);
        self.distributor.set(distributor);
    }

    /// Set the marketplace address (admin only)
    pub fn set_marketplace(&mut self, marketplace: Address) {
        self.only_admin();
        self.marketplace.set(marketplace);
    }

    // ========================================
    // Custody (marketplace only)
    // ========================================

    /// Take custody of collateral for a loan
    ///
    /// Native collateral must be attached to the call; token collateral is
    /// pulled from the owner, who must have approved this contract.
    #[odra(payable)]
    pub fn lock_collateral(&mut self, loan_id: u64, owner: Address, asset: String, amount: U256) {
        self.only_marketplace();
        if amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }
        if let Some(existing) = self.positions.get(&loan_id) {
            if !existing.amount.is_zero() {
                self.env().revert(ProtocolError::InvalidConfiguration);
            }
        }

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(asset.clone());

        match info.kind {
            AssetKind::Native => {
                let attached = self.env().attached_value();
                if attached != U512::from(amount.as_u128()) {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
            }
            AssetKind::Token => {
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let self_address = self.env().self_address();
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer_from(owner, self_address, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        self.positions.set(
            &loan_id,
            CollateralPosition {
                loan_id,
                owner,
                asset: asset.clone(),
                amount,
            },
        );

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CollateralLocked {
            loan_id,
            owner,
            asset,
            amount,
            timestamp,
        });
    }

    /// Release the full position for a loan to `to`
    pub fn release_collateral(&mut self, loan_id: u64, to: Address) {
        self.only_marketplace();

        let mut position = self
            .positions
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::CollateralNotFound);
        if position.amount.is_zero() {
            self.env().revert(ProtocolError::CollateralNotFound);
        }

        let asset = position.asset.clone();
        let amount = position.amount;
        position.amount = U256::zero();
        self.positions.set(&loan_id, position);

        self.pay_out(&asset, to, amount);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CollateralReleased {
            loan_id,
            to,
            asset,
            amount,
            timestamp,
        });
    }

    /// Seize the position for a loan and deliver its value to the
    /// distributor, denominated in `proceeds_asset`. Returns the proceeds.
    pub fn liquidate(&mut self, loan_id: u64, proceeds_asset: String) -> U256 {
        self.only_marketplace();

        let mut position = self
            .positions
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::CollateralNotFound);
        if position.amount.is_zero() {
            self.env().revert(ProtocolError::CollateralNotFound);
        }

        let collateral_asset = position.asset.clone();
        let collateral_amount = position.amount;
        position.amount = U256::zero();
        self.positions.set(&loan_id, position);

        let proceeds = if collateral_asset == proceeds_asset {
            self.deliver_to_distributor(&collateral_asset, collateral_amount, loan_id);
            collateral_amount
        } else {
            self.convert_through_desk(
                &collateral_asset,
                collateral_amount,
                &proceeds_asset,
                loan_id,
            )
        };

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CollateralLiquidated {
            loan_id,
            collateral_asset,
            collateral_amount,
            proceeds_asset,
            proceeds,
            timestamp,
        });

        proceeds
    }

    // ========================================
    // Valuation
    // ========================================

    /// Collateral value of a loan against its outstanding USD value,
    /// in basis points
    pub fn health_factor_bps(&self, loan_id: u64, outstanding_value_usd: U256) -> u32 {
        let position = self
            .positions
            .get(&loan_id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::CollateralNotFound);

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let collateral_value = PriceOracleContractRef::new(self.env(), oracle)
            .usd_value(position.asset, position.amount);

        LoanMath::ratio_bps(collateral_value, outstanding_value_usd).unwrap_or_revert(&self.env())
    }

    /// Ratio of collateral value to loan value at current prices,
    /// in basis points
    pub fn collateral_ratio_bps(
        &self,
        collateral_asset: String,
        collateral_amount: U256,
        loan_asset: String,
        loan_amount: U256,
    ) -> u32 {
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle_ref = PriceOracleContractRef::new(self.env(), oracle);

        let collateral_value = oracle_ref.usd_value(collateral_asset, collateral_amount);
        let loan_value = oracle_ref.usd_value(loan_asset, loan_amount);

        LoanMath::ratio_bps(collateral_value, loan_value).unwrap_or_revert(&self.env())
    }

    /// The position held for a loan, if any
    pub fn position_of(&self, loan_id: u64) -> Option<CollateralPosition> {
        self.positions.get(&loan_id)
    }

    // ========================================
    // Internals
    // ========================================

    fn deliver_to_distributor(&mut self, asset: &str, amount: U256, loan_id: u64) {
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(String::from(asset));
        let distributor = self
            .distributor
            .get_or_revert_with(ProtocolError::InvalidConfiguration);

        match info.kind {
            AssetKind::Native => {
                ProceedsSinkContractRef::new(self.env(), distributor)
                    .with_tokens(U512::from(amount.as_u128()))
                    .fund_escrow(loan_id);
            }
            AssetKind::Token => {
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer(distributor, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }
    }

    fn convert_through_desk(
        &mut self,
        asset_in: &str,
        amount_in: U256,
        asset_out: &str,
        loan_id: u64,
    ) -> U256 {
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle_ref = PriceOracleContractRef::new(self.env(), oracle);
        let info_in = oracle_ref.asset_info(String::from(asset_in));
        let info_out = oracle_ref.asset_info(String::from(asset_out));
        let quote_in = oracle_ref.get_latest_price(String::from(asset_in));
        let quote_out = oracle_ref.get_latest_price(String::from(asset_out));

        // Expect the exact amount the desk prices from the same feeds
        let min_out = LoanMath::convert_amount(
            amount_in,
            quote_in.price_usd,
            quote_in.decimals,
            info_in.decimals,
            quote_out.price_usd,
            quote_out.decimals,
            info_out.decimals,
        )
        .unwrap_or_revert(&self.env());

        let desk = self
            .swap_desk
            .get_or_revert_with(ProtocolError::InvalidConfiguration);

        match info_in.kind {
            AssetKind::Native => SwapDeskContractRef::new(self.env(), desk)
                .with_tokens(U512::from(amount_in.as_u128()))
                .convert(
                    String::from(asset_in),
                    amount_in,
                    String::from(asset_out),
                    min_out,
                    loan_id,
                ),
            AssetKind::Token => {
                let token = info_in
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.approve(desk, amount_in) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
                SwapDeskContractRef::new(self.env(), desk).convert(
                    String::from(asset_in),
                    amount_in,
                    String::from(asset_out),
                    min_out,
                    loan_id,
                )
            }
        }
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
