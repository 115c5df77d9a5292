#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
extern crate alloc;

// Lending protocol modules
pub mod lending;

// Shared fixed-point and loan arithmetic
pub mod math;

// CEP-18 asset token
pub mod token;
