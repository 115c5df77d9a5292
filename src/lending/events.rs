//! Events for the lending protocol

use odra::casper_types::U256;
use odra::prelude::*;

// ============================================================================
// Asset Registry / Oracle Events
// ============================================================================

/// Event emitted when an asset is added to the registry
#[odra::event]
pub struct AssetRegistered {
    /// Registry identifier of the asset
    pub asset: String,
    /// Token contract backing the asset, absent for the native asset
    pub token: Option<Address>,
    /// Asset decimals
    pub decimals: u8,
    /// Admin that registered the asset
    pub registered_by: Address,
}

/// Event emitted when a price is published for an asset
#[odra::event]
pub struct PricePublished {
    /// Registry identifier of the asset
    pub asset: String,
    /// USD price in feed units
    pub price_usd: U256,
    /// Feed decimals
    pub decimals: u8,
    /// Timestamp of publication
    pub timestamp: u64,
}

/// Event emitted when the price publisher is rotated
#[odra::event]
pub struct PublisherChanged {
    /// Previous publisher
    pub old_publisher: Address,
    /// New publisher
    pub new_publisher: Address,
}

/// Event emitted when the staleness window is updated
#[odra::event]
pub struct MaxStalenessUpdated {
    /// Previous window in milliseconds
    pub old_ms: u64,
    /// New window in milliseconds
    pub new_ms: u64,
    /// Admin that updated the window
    pub updated_by: Address,
}

// ============================================================================
// Identity Events
// ============================================================================

/// Event emitted when an address passes identity verification
#[odra::event]
pub struct IdentityRegistered {
    /// Verified address
    pub account: Address,
    /// Uniqueness token bound to the address
    pub uniqueness_token: String,
    /// Timestamp of registration
    pub timestamp: u64,
}

/// Event emitted when an attestation is recorded
#[odra::event]
pub struct AttestationAdded {
    /// Uniqueness token carried by the attestation
    pub uniqueness_token: String,
    /// Subject the attestation is issued for
    pub subject: Address,
    /// Operator that recorded the attestation
    pub attested_by: Address,
}

/// Event emitted when an attestation is revoked
#[odra::event]
pub struct AttestationRevoked {
    /// Uniqueness token of the revoked attestation
    pub uniqueness_token: String,
    /// Operator that revoked the attestation
    pub revoked_by: Address,
}

// ============================================================================
// Credit Events
// ============================================================================

/// Event emitted when a credit score changes
#[odra::event]
pub struct CreditScoreUpdated {
    /// Affected address
    pub account: Address,
    /// Score before the update
    pub old_score: u16,
    /// Score after the update
    pub new_score: u16,
    /// Completed loan count after the update
    pub completed_loans: u32,
    /// Defaulted loan count after the update
    pub defaulted_loans: u32,
    /// Timestamp of the update
    pub timestamp: u64,
}

/// Event emitted when credit parameters are updated
#[odra::event]
pub struct CreditParamsUpdated {
    /// Baseline score for new participants
    pub baseline: u16,
    /// Lower score bound
    pub min_score: u16,
    /// Upper score bound
    pub max_score: u16,
    /// Score reward per completed loan
    pub completion_reward: u16,
    /// Base score penalty per default
    pub default_penalty: u16,
    /// Admin that updated the parameters
    pub updated_by: Address,
}

// ============================================================================
// Collateral Events
// ============================================================================

/// Event emitted when collateral is locked for a loan
#[odra::event]
pub struct CollateralLocked {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower that posted the collateral
    pub owner: Address,
    /// Collateral asset
    pub asset: String,
    /// Amount locked
    pub amount: U256,
    /// Timestamp of the lock
    pub timestamp: u64,
}

/// Event emitted when collateral is released back to the borrower
#[odra::event]
pub struct CollateralReleased {
    /// Loan identifier
    pub loan_id: u64,
    /// Recipient of the collateral
    pub to: Address,
    /// Collateral asset
    pub asset: String,
    /// Amount released
    pub amount: U256,
    /// Timestamp of the release
    pub timestamp: u64,
}

/// Event emitted when collateral is liquidated into proceeds
#[odra::event]
pub struct CollateralLiquidated {
    /// Loan identifier
    pub loan_id: u64,
    /// Seized collateral asset
    pub collateral_asset: String,
    /// Amount of collateral seized
    pub collateral_amount: U256,
    /// Asset the proceeds are denominated in
    pub proceeds_asset: String,
    /// Proceeds delivered to settlement
    pub proceeds: U256,
    /// Timestamp of the liquidation
    pub timestamp: u64,
}

// ============================================================================
// Loan Lifecycle Events
// ============================================================================

/// Event emitted when a loan request is created
#[odra::event]
pub struct LoanRequested {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower address
    pub borrower: Address,
    /// Requested principal
    pub principal: U256,
    /// Asset the principal is denominated in
    pub loan_asset: String,
    /// Interest rate in basis points over the full term
    pub interest_rate_bps: u32,
    /// Loan duration in milliseconds
    pub duration_ms: u64,
    /// Collateral amount locked
    pub collateral_amount: U256,
    /// Collateral asset
    pub collateral_asset: String,
    /// Timestamp of creation
    pub timestamp: u64,
}

/// Event emitted when a lender funds part of a loan request
#[odra::event]
pub struct LoanFunded {
    /// Loan identifier
    pub loan_id: u64,
    /// Contributing lender
    pub lender: Address,
    /// Contribution amount
    pub amount: U256,
    /// Total funded after this contribution
    pub funded_amount: U256,
    /// Timestamp of the contribution
    pub timestamp: u64,
}

/// Event emitted when a fully funded loan activates
#[odra::event]
pub struct LoanActivated {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower that received the principal
    pub borrower: Address,
    /// Principal paid out
    pub principal: U256,
    /// Timestamp of activation
    pub timestamp: u64,
}

/// Event emitted when an open loan request is cancelled
#[odra::event]
pub struct LoanCancelled {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower that cancelled
    pub borrower: Address,
    /// Total refunded to lenders
    pub refunded_total: U256,
    /// Timestamp of cancellation
    pub timestamp: u64,
}

/// Event emitted when an active loan is repaid in full
#[odra::event]
pub struct LoanRepaid {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower that repaid
    pub borrower: Address,
    /// Amount moved into settlement escrow
    pub amount: U256,
    /// Interest portion of the amount due
    pub interest: U256,
    /// Timestamp of repayment
    pub timestamp: u64,
}

/// Event emitted when an active loan is defaulted
#[odra::event]
pub struct LoanDefaulted {
    /// Loan identifier
    pub loan_id: u64,
    /// Borrower that defaulted
    pub borrower: Address,
    /// Liquidation proceeds moved into settlement escrow
    pub proceeds: U256,
    /// Timestamp of the default
    pub timestamp: u64,
}

// ============================================================================
// Settlement Events
// ============================================================================

/// Event emitted when settled funds are recorded for a loan
#[odra::event]
pub struct EscrowDeposited {
    /// Loan identifier
    pub loan_id: u64,
    /// Asset the escrow is denominated in
    pub asset: String,
    /// Amount added to the escrow
    pub amount: U256,
    /// Escrow total after the deposit
    pub total_escrow: U256,
    /// Timestamp of the deposit
    pub timestamp: u64,
}

/// Event emitted when a lender claims their share of an escrow
#[odra::event]
pub struct RepaymentClaimed {
    /// Loan identifier
    pub loan_id: u64,
    /// Claiming lender
    pub lender: Address,
    /// Amount paid out by this claim
    pub amount: U256,
    /// Timestamp of the claim
    pub timestamp: u64,
}

// ============================================================================
// Conversion Desk Events
// ============================================================================

/// Event emitted when inventory is added to the swap desk
#[odra::event]
pub struct InventoryFunded {
    /// Asset funded
    pub asset: String,
    /// Amount added
    pub amount: U256,
    /// Admin that funded the inventory
    pub funded_by: Address,
    /// Timestamp of the funding
    pub timestamp: u64,
}

/// Event emitted when inventory is withdrawn from the swap desk
#[odra::event]
pub struct InventoryWithdrawn {
    /// Asset withdrawn
    pub asset: String,
    /// Amount removed
    pub amount: U256,
    /// Recipient of the withdrawal
    pub to: Address,
    /// Timestamp of the withdrawal
    pub timestamp: u64,
}

/// Event emitted when the desk converts one asset into another
#[odra::event]
pub struct AssetConverted {
    /// Input asset
    pub asset_in: String,
    /// Input amount
    pub amount_in: U256,
    /// Output asset
    pub asset_out: String,
    /// Output amount delivered
    pub amount_out: U256,
    /// Loan the conversion settles
    pub loan_id: u64,
    /// Timestamp of the conversion
    pub timestamp: u64,
}

// ============================================================================
// Admin Events
// ============================================================================

/// Event emitted when protocol configuration changes
#[odra::event]
pub struct ConfigUpdated {
    /// Minimum loan principal
    pub min_loan_amount: U256,
    /// Maximum loan principal
    pub max_loan_amount: U256,
    /// Creation-time collateral ratio floor in basis points
    pub min_collateral_ratio_bps: u32,
    /// Health factor below which a loan can be defaulted, in basis points
    pub liquidation_threshold_bps: u32,
    /// Admin that updated the configuration
    pub updated_by: Address,
}

/// Event emitted when the marketplace is paused
#[odra::event]
pub struct ContractPaused {
    /// Address that paused
    pub paused_by: Address,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the marketplace is unpaused
#[odra::event]
pub struct ContractUnpaused {
    /// Address that unpaused
    pub unpaused_by: Address,
    /// Timestamp
    pub timestamp: u64,
}
