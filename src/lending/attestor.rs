//! Proof Attestor - Reference identity verifier
//!
//! An operator records accepted proof blobs together with the uniqueness
//! token and subject they attest to. Verification is a lookup: a proof is
//! valid only for the subject it was attested for. Stands in for an
//! off-chain cryptographic verifier.

use super::errors::ProtocolError;
use super::events::*;
use super::identity_gate::VerificationOutcome;
use odra::prelude::*;

/// A recorded attestation
#[odra::odra_type]
pub struct Attestation {
    /// Stable identifier for the attested identity
    pub uniqueness_token: String,
    /// Address the proof belongs to
    pub subject: Address,
}

/// Proof Attestor contract
#[odra::module]
pub struct ProofAttestor {
    /// Accepted proofs and what they attest to
    attestations: Mapping<Vec<u8>, Attestation>,

    /// Operator address
    admin: Var<Address>,
}

#[odra::module]
impl ProofAttestor {
    /// Initialize the attestor, the deployer becomes the operator
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.admin.set(caller);
    }

    /// Record an accepted proof (operator only)
    pub fn attest(&mut self, proof: Vec<u8>, uniqueness_token: String, subject: Address) {
        self.only_admin();

        let attestation = Attestation {
            uniqueness_token: uniqueness_token.clone(),
            subject,
        };
        self.attestations.set(&proof, attestation);

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(AttestationAdded {
            uniqueness_token,
            subject,
            attested_by: admin,
        });
    }

    /// Revoke an accepted proof (operator only)
    ///
    /// The slot is overwritten with an empty token, which `verify` treats
    /// as invalid.
    pub fn revoke(&mut self, proof: Vec<u8>) {
        self.only_admin();

        let attestation = self
            .attestations
            .get(&proof)
            .unwrap_or_revert_with(&self.env(), ProtocolError::IdentityNotVerified);
        self.attestations.set(
            &proof,
            Attestation {
                uniqueness_token: String::new(),
                subject: attestation.subject,
            },
        );

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(AttestationRevoked {
            uniqueness_token: attestation.uniqueness_token,
            revoked_by: admin,
        });
    }

    /// Check a proof against a claimed address
    pub fn verify(&self, proof: Vec<u8>, claimed: Address) -> VerificationOutcome {
        match self.attestations.get(&proof) {
            Some(attestation) => VerificationOutcome {
                valid: !attestation.uniqueness_token.is_empty()
                    && attestation.subject == claimed,
                uniqueness_token: attestation.uniqueness_token,
            },
            None => VerificationOutcome {
                valid: false,
                uniqueness_token: String::new(),
            },
        }
    }

    /// Get the operator address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(ProtocolError::Unauthorized)
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}
