//! Identity Gate - Sybil-resistant identity verification
//!
//! Delegates proof checking to an external verifier and binds the returned
//! uniqueness token to the caller, one address per token, permanently.

use super::errors::ProtocolError;
use super::events::*;
use odra::prelude::*;
use odra::ContractRef;

/// Result of checking an identity proof
#[odra::odra_type]
pub struct VerificationOutcome {
    /// Whether the proof is valid for the claimed address
    pub valid: bool,
    /// Stable identifier for the underlying identity
    pub uniqueness_token: String,
}

/// External identity verifier interface
#[odra::external_contract]
pub trait IdentityVerifier {
    /// Check a proof against the claimed address
    fn verify(&self, proof: Vec<u8>, claimed: Address) -> VerificationOutcome;
}

/// Identity Gate contract
#[odra::module]
pub struct IdentityGate {
    /// Uniqueness token to the address it is bound to
    bindings: Mapping<String, Address>,

    /// Latest uniqueness token bound per address
    tokens: Mapping<Address, String>,

    /// Verified flag per address
    verified: Mapping<Address, bool>,

    /// External verifier address
    verifier: Var<Address>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl IdentityGate {
    /// Initialize the gate with the verifier address
    pub fn init(&mut self, verifier: Address) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.verifier.set(verifier);
    }

    /// Verify the caller's identity proof and bind its uniqueness token
    ///
    /// Re-registering the same token for the same address succeeds without
    /// effect. A token already bound to a different address is rejected
    /// permanently.
    pub fn register_verification(&mut self, proof: Vec<u8>) -> VerificationOutcome {
        let caller = self.env().caller();

        let verifier_address = self
            .verifier
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let verifier = IdentityVerifierContractRef::new(self.env(), verifier_address);
        let outcome = verifier.verify(proof, caller);

        if !outcome.valid {
            self.env().revert(ProtocolError::IdentityNotVerified);
        }

        if let Some(bound) = self.bindings.get(&outcome.uniqueness_token) {
            if bound != caller {
                self.env().revert(ProtocolError::IdentityAlreadyUsed);
            }
            // Same token, same address: idempotent
            return outcome;
        }

        self.bindings.set(&outcome.uniqueness_token, caller);
        self.tokens.set(&caller, outcome.uniqueness_token.clone());
        self.verified.set(&caller, true);

        let timestamp = self.env().get_block_time();
        self.env().emit_event(IdentityRegistered {
            account: caller,
            uniqueness_token: outcome.uniqueness_token.clone(),
            timestamp,
        });

        outcome
    }

    /// Whether an address has passed verification
    pub fn is_verified(&self, account: Address) -> bool {
        self.verified.get(&account).unwrap_or(false)
    }

    /// Address a uniqueness token is bound to, if any
    pub fn binding_of(&self, uniqueness_token: String) -> Option<Address> {
        self.bindings.get(&uniqueness_token)
    }

    /// Latest uniqueness token bound to an address, if any
    pub fn token_of(&self, account: Address) -> Option<String> {
        self.tokens.get(&account)
    }

    /// Rotate the verifier address (admin only)
    pub fn set_verifier(&mut self, verifier: Address) {
        self.only_admin();
        self.verifier.set(verifier);
    }

    /// Get the verifier address
    pub fn get_verifier(&self) -> Address {
        self.verifier
            .get_or_revert_with(ProtocolError::InvalidConfiguration)
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
