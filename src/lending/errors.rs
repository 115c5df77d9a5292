//! Error types for the lending protocol

use odra::prelude::*;

/// Errors that can occur across the lending protocol
#[odra::odra_error]
pub enum ProtocolError {
    // Amount/Input Errors
    /// Amount is zero, out of bounds, or does not match the attached value
    InvalidAmount = 1,
    /// Loan duration is zero
    InvalidDuration = 2,
    /// Invalid configuration parameter
    InvalidConfiguration = 3,

    // Asset Registry / Oracle Errors
    /// Asset is not registered with the oracle
    TokenNotSupported = 4,
    /// Price feed is missing or older than the staleness window
    StalePriceFeed = 5,

    // Access Control Errors
    /// Caller is not authorized
    Unauthorized = 6,
    /// Contract is paused
    ContractPaused = 7,

    // Identity Errors
    /// Caller has not passed identity verification
    IdentityNotVerified = 8,
    /// Uniqueness token is already bound to a different address
    IdentityAlreadyUsed = 9,

    // Loan Lifecycle Errors
    /// Loan request does not exist
    LoanNotFound = 10,
    /// Loan is not in the Open status
    LoanNotOpen = 11,
    /// Loan is not in the Active status
    LoanNotActive = 12,
    /// Loan has already been defaulted
    AlreadyDefaulted = 13,
    /// Loan is not in a settled status (Repaid or Defaulted)
    LoanNotSettled = 14,
    /// Collateral ratio is below the configured minimum
    InsufficientCollateralRatio = 15,
    /// Position is healthy and not past due, cannot default
    PositionHealthy = 16,

    // Custody/Settlement Errors
    /// No collateral position recorded for the loan
    CollateralNotFound = 17,
    /// Asset transfer failed
    TransferFailed = 18,
    /// Not enough inventory to settle the conversion
    InsufficientLiquidity = 19,
    /// Conversion output is below the requested minimum
    InsufficientOutput = 20,

    // Math Errors
    /// Math overflow occurred
    MathOverflow = 21,
    /// Math underflow occurred
    MathUnderflow = 22,
    /// Division by zero
    DivisionByZero = 23,
}
