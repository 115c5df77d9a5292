//! Peer-to-peer collateralized lending protocol
//!
//! This module provides a fixed-term loan marketplace where borrowers post
//! collateral and multiple lenders fund a request together. Repayments and
//! liquidation proceeds settle pro rata through a shared escrow, borrower
//! reputation is tracked on-chain, and a uniqueness-token identity gate
//! keeps one borrowing identity per person.

pub mod attestor;
pub mod collateral_vault;
pub mod credit_score;
pub mod errors;
pub mod events;
pub mod identity_gate;
pub mod marketplace;
pub mod price_oracle;
pub mod repayment_distributor;
pub mod swap_desk;


pub use attestor::ProofAttestor;
pub use collateral_vault::CollateralVault;
pub use credit_score::CreditScoreEngine;
pub use errors::ProtocolError;
pub use events::*;
pub use identity_gate::IdentityGate;
pub use marketplace::LoanMarketplace;
pub use price_oracle::PriceOracle;
pub use repayment_distributor::RepaymentDistributor;
pub use swap_desk::SwapDesk;
