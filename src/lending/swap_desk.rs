//! Swap Desk - protocol-owned inventory for asset conversion
//!
//! Converts one supported asset into another at oracle prices, drawing the
//! output from an admin-funded inventory. Liquidations use it to turn seized
//! collateral into the loan asset; every conversion delivers its output to
//! the configured proceeds sink.

use super::errors::ProtocolError;
use super::events::*;
use super::price_oracle::{AssetKind, PriceOracleContractRef};
use crate::math::{LoanMath, SafeMath};
use crate::token::Cep18TokenContractRef;
use odra::casper_types::{U256, U512};
use odra::prelude::*;
use odra::ContractRef;

/// Contracts able to receive conversion proceeds on behalf of a loan
#[odra::external_contract]
pub trait ProceedsSink {
    /// Accept attached native value as escrow for a loan
    fn fund_escrow(&mut self, loan_id: u64);
}

/// Swap Desk contract
#[odra::module]
pub struct SwapDesk {
    /// Inventory held per asset id
    inventory: Mapping<String, U256>,

    /// Price oracle address
    price_oracle: Var<Address>,

    /// Recipient of all conversion proceeds
    proceeds_sink: Var<Address>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl SwapDesk {
    /// Initialize the desk with the oracle and the proceeds recipient
    pub fn init(&mut self, price_oracle: Address, proceeds_sink: Address) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.price_oracle.set(price_oracle);
        self.proceeds_sink.set(proceeds_sink);
    }

    // ========================================
    // Conversion
    // ========================================

    /// Convert `amount_in` of one supported asset into another at current
    /// oracle prices and deliver the output to the proceeds sink for
    /// `loan_id`. Returns the output amount.
    ///
    /// Native input must be attached to the call. Token input is pulled from
    /// the caller, which must have approved this contract beforehand.
    #[odra(payable)]
    pub fn convert(
        &mut self,
        asset_in: String,
        amount_in: U256,
        asset_out: String,
        min_amount_out: U256,
        loan_id: u64,
    ) -> U256 {
        if amount_in.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle_ref = PriceOracleContractRef::new(self.env(), oracle);

        let info_in = oracle_ref.asset_info(asset_in.clone());
        let info_out = oracle_ref.asset_info(asset_out.clone());
        let amount_out = self.priced_output(&oracle_ref, &asset_in, amount_in, &asset_out);

        if amount_out < min_amount_out {
            self.env().revert(ProtocolError::InsufficientOutput);
        }

        // Take custody of the input before touching the books
        let caller = self.env().caller();
        match info_in.kind {
            AssetKind::Native => {
                let attached = self.env().attached_value();
                if attached != U512::from(amount_in.as_u128()) {
                    self.env().revert(ProtocolError::InvalidAmount);
                }
            }
            AssetKind::Token => {
                let token = info_in
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let self_address = self.env().self_address();
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer_from(caller, self_address, amount_in) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        let in_balance = self.inventory.get(&asset_in).unwrap_or_default();
        let credited = SafeMath::add(in_balance, amount_in).unwrap_or_revert(&self.env());
        self.inventory.set(&asset_in, credited);

        // Re-read so a same-asset conversion sees its own input
        let out_balance = self.inventory.get(&asset_out).unwrap_or_default();
        if out_balance < amount_out {
            self.env().revert(ProtocolError::InsufficientLiquidity);
        }
        self.inventory.set(&asset_out, out_balance - amount_out);

        let sink = self
            .proceeds_sink
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        match info_out.kind {
            AssetKind::Native => {
                ProceedsSinkContractRef::new(self.env(), sink)
                    .with_tokens(U512::from(amount_out.as_u128()))
                    .fund_escrow(loan_id);
            }
            AssetKind::Token => {
                let token = info_out
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer(sink, amount_out) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        let timestamp = self.env().get_block_time();
        self.env().emit_event(AssetConverted {
            asset_in,
            amount_in,
            asset_out,
            amount_out,
            loan_id,
            timestamp,
        });

        amount_out
    }

    /// Output amount a conversion would produce at current oracle prices.
    /// Does not consult the inventory.
    pub fn quote(&self, asset_in: String, amount_in: U256, asset_out: String) -> U256 {
        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let oracle_ref = PriceOracleContractRef::new(self.env(), oracle);
        self.priced_output(&oracle_ref, &asset_in, amount_in, &asset_out)
    }

    // ========================================
    // Inventory Management
    // ========================================

    /// Add inventory for an asset (admin only)
    ///
    /// Native inventory must be attached to the call; token inventory is
    /// pulled from the admin, which must have approved this contract.
    #[odra(payable)]
    pub fn fund_inventory(&mut self, asset: String, amount: U256) {
        self.only_admin();
        if amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(asset.clone());

        let caller = self.env().caller();
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
                if !token_ref.transfer_from(caller, self_address, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        let balance = self.inventory.get(&asset).unwrap_or_default();
        let total = SafeMath::add(balance, amount).unwrap_or_revert(&self.env());
        self.inventory.set(&asset, total);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(InventoryFunded {
            asset,
            amount,
            funded_by: caller,
            timestamp,
        });
    }

    /// Withdraw inventory to the admin account (admin only)
    pub fn withdraw_inventory(&mut self, asset: String, amount: U256) {
        self.only_admin();
        if amount.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        let balance = self.inventory.get(&asset).unwrap_or_default();
        if balance < amount {
            self.env().revert(ProtocolError::InsufficientLiquidity);
        }
        self.inventory.set(&asset, balance - amount);

        let oracle = self
            .price_oracle
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let info = PriceOracleContractRef::new(self.env(), oracle).asset_info(asset.clone());

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        match info.kind {
            AssetKind::Native => {
                self.env()
                    .transfer_tokens(&admin, &U512::from(amount.as_u128()));
            }
            AssetKind::Token => {
                let token = info
                    .token
                    .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported);
                let mut token_ref = Cep18TokenContractRef::new(self.env(), token);
                if !token_ref.transfer(admin, amount) {
                    self.env().revert(ProtocolError::TransferFailed);
                }
            }
        }

        let timestamp = self.env().get_block_time();
        self.env().emit_event(InventoryWithdrawn {
            asset,
            amount,
            to: admin,
            timestamp,
        });
    }

    // ========================================
    // Views
    // ========================================

    /// Inventory held for an asset
    pub fn inventory_of(&self, asset: String) -> U256 {
        self.inventory.get(&asset).unwrap_or_default()
    }

    /// Get the proceeds sink address
    pub fn get_proceeds_sink(&self) -> Address {
        self.proceeds_sink
            .get_or_revert_with(ProtocolError::InvalidConfiguration)
    }

    // ========================================
    // Internals
    // ========================================

    fn priced_output(
        &self,
        oracle_ref: &PriceOracleContractRef,
        asset_in: &str,
        amount_in: U256,
        asset_out: &str,
    ) -> U256 {
        let info_in = oracle_ref.asset_info(String::from(asset_in));
        let info_out = oracle_ref.asset_info(String::from(asset_out));
        let quote_in = oracle_ref.get_latest_price(String::from(asset_in));
        let quote_out = oracle_ref.get_latest_price(String::from(asset_out));

        LoanMath::convert_amount(
            amount_in,
            quote_in.price_usd,
            quote_in.decimals,
            info_in.decimals,
            quote_out.price_usd,
            quote_out.decimals,
            info_out.decimals,
        )
        .unwrap_or_revert(&self.env())
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
