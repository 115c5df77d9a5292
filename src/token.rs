//! CEP-18 compatible token used for protocol assets
//! Loan principal and collateral tokens are deployed from this module
use odra::casper_types::U256;
use odra::prelude::*;

/// Errors raised by the asset token
#[odra::odra_error]
pub enum TokenError {
    /// Balance too low for the transfer
    InsufficientBalance = 1,
    /// Allowance too low for the transfer
    InsufficientAllowance = 2,
    /// Caller is not the minter
    Unauthorized = 3,
}

/// CEP-18 transfer event
#[odra::event]
pub struct Transfer {
    /// Sender
    pub from: Address,
    /// Recipient
    pub to: Address,
    /// Amount moved
    pub value: U256,
}

/// CEP-18 approval event
#[odra::event]
pub struct Approval {
    /// Owner granting the allowance
    pub owner: Address,
    /// Spender receiving the allowance
    pub spender: Address,
    /// Allowance amount
    pub value: U256,
}

/// Asset token module implementing the CEP-18 standard
#[odra::module]
pub struct AssetToken {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Token decimals
    decimals: Var<u8>,
    /// Total supply of tokens
    total_supply: Var<U256>,
    /// Balance mapping: owner -> balance
    balances: Mapping<Address, U256>,
    /// Allowance mapping: owner -> spender -> amount
    allowances: Mapping<(Address, Address), U256>,
    /// Address allowed to mint and burn
    minter: Var<Address>,
}

#[odra::module]
impl AssetToken {
    /// Initialize the token. The deployer becomes the minter.
    pub fn init(&mut self, name: String, symbol: String, decimals: u8) {
        let caller = self.env().caller();
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());
        self.minter.set(caller);
    }

    /// Get the token name
    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    /// Get the token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    /// Get the token decimals
    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    /// Get the total supply
    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    /// Get the balance of an address
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    /// Get the allowance for a spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    /// Transfer tokens to another address
    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.transfer_internal(caller, to, amount);
        true
    }

    /// Approve a spender to spend tokens
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.approve_internal(caller, spender, amount);
        true
    }

    /// Transfer tokens from one address to another (requires approval)
    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        let current_allowance = self.allowance(from, caller);

        if current_allowance < amount {
            self.env().revert(TokenError::InsufficientAllowance);
        }

        self.approve_internal(from, caller, current_allowance - amount);
        self.transfer_internal(from, to, amount);
        true
    }

    /// Mint new tokens (minter only)
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.only_minter();

        let current_supply = self.total_supply();
        self.total_supply.set(current_supply + amount);

        let current_balance = self.balance_of(to);
        self.balances.set(&to, current_balance + amount);

        self.env().emit_event(Transfer {
            from: self.env().self_address(),
            to,
            value: amount,
        });
    }

    /// Burn tokens (minter only)
    pub fn burn(&mut self, from: Address, amount: U256) {
        self.only_minter();

        let current_balance = self.balance_of(from);
        if current_balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }

        self.balances.set(&from, current_balance - amount);

        let current_supply = self.total_supply();
        self.total_supply.set(current_supply - amount);

        self.env().emit_event(Transfer {
            from,
            to: self.env().self_address(),
            value: amount,
        });
    }

    /// Internal transfer function
    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }

        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(Transfer {
            from,
            to,
            value: amount,
        });
    }

    /// Internal approve function
    fn approve_internal(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.set(&(owner, spender), amount);

        self.env().emit_event(Approval {
            owner,
            spender,
            value: amount,
        });
    }

    fn only_minter(&self) {
        let caller = self.env().caller();
        let minter = self.minter.get_or_revert_with(TokenError::Unauthorized);
        if caller != minter {
            self.env().revert(TokenError::Unauthorized);
        }
    }
}

/// External token interface for interacting with CEP-18 tokens
#[odra::external_contract]
pub trait Cep18Token {
    /// Get the balance of an address
    fn balance_of(&self, owner: Address) -> U256;

    /// Transfer tokens
    fn transfer(&mut self, to: Address, amount: U256) -> bool;

    /// Transfer tokens from another address
    fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool;

    /// Approve a spender
    fn approve(&mut self, spender: Address, amount: U256) -> bool;

    /// Get allowance
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Get total supply
    fn total_supply(&self) -> U256;

    /// Get token name
    fn name(&self) -> String;

    /// Get token symbol
    fn symbol(&self) -> String;

    /// Get token decimals
    fn decimals(&self) -> u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::{Deployer, HostEnv};

    fn setup() -> (HostEnv, AssetTokenHostRef) {
        let env = odra_test::env();
        let init_args = AssetTokenInitArgs {
            name: String::from("USD Loan Token"),
            symbol: String::from("USDL"),
            decimals: 9,
        };
        let token = AssetToken::deploy(&env, init_args);
        (env, token)
    }

    #[test]
    fn test_init() {
        let (_, token) = setup();
        assert_eq!(token.name(), "USD Loan Token");
        assert_eq!(token.symbol(), "USDL");
        assert_eq!(token.decimals(), 9);
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_mint_and_burn() {
        let (env, mut token) = setup();
        let user = env.get_account(1);
        let amount = U256::from(1000);

        token.mint(user, amount);
        assert_eq!(token.balance_of(user), amount);
        assert_eq!(token.total_supply(), amount);

        token.burn(user, amount);
        assert_eq!(token.balance_of(user), U256::zero());
        assert_eq!(token.total_supply(), U256::zero());
    }

    #[test]
    fn test_mint_requires_minter() {
        let (env, mut token) = setup();
        let user = env.get_account(1);

        env.set_caller(user);
        let result = token.try_mint(user, U256::from(1000));
        assert_eq!(result.unwrap_err(), TokenError::Unauthorized.into());
    }

    #[test]
    fn test_transfer() {
        let (env, mut token) = setup();
        let user1 = env.get_account(0);
        let user2 = env.get_account(1);
        let amount = U256::from(1000);

        token.mint(user1, amount);

        env.set_caller(user1);
        token.transfer(user2, U256::from(500));

        assert_eq!(token.balance_of(user1), U256::from(500));
        assert_eq!(token.balance_of(user2), U256::from(500));
    }

    #[test]
    fn test_transfer_from_needs_allowance() {
        let (env, mut token) = setup();
        let owner = env.get_account(1);
        let spender = env.get_account(2);

        token.mint(owner, U256::from(1000));

        env.set_caller(spender);
        let result = token.try_transfer_from(owner, spender, U256::from(100));
        assert_eq!(result.unwrap_err(), TokenError::InsufficientAllowance.into());

        env.set_caller(owner);
        token.approve(spender, U256::from(100));

        env.set_caller(spender);
        token.transfer_from(owner, spender, U256::from(100));
        assert_eq!(token.balance_of(spender), U256::from(100));
        assert_eq!(token.allowance(owner, spender), U256::zero());
    }
}
