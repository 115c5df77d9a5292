//! Credit Score Engine - Reputation tracking for borrowers
//!
//! Keeps a bounded score per participant, moved only by the marketplace at
//! loan settlement: completions reward, defaults penalize, with the penalty
//! scaled by how far past due the loan ran.

use super::errors::ProtocolError;
use super::events::*;
use odra::prelude::*;

/// Score parameters
#[odra::odra_type]
pub struct CreditParams {
    /// Score assigned to participants with no history
    pub baseline: u16,
    /// Lower score bound
    pub min_score: u16,
    /// Upper score bound
    pub max_score: u16,
    /// Score added per completed loan
    pub completion_reward: u16,
    /// Base score subtracted per default, scaled up to 2x by overdue time
    pub default_penalty: u16,
}

impl CreditParams {
    /// Check internal consistency of the parameters
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.min_score > self.max_score {
            return Err(ProtocolError::InvalidConfiguration);
        }
        if self.baseline < self.min_score || self.baseline > self.max_score {
            return Err(ProtocolError::InvalidConfiguration);
        }
        Ok(())
    }
}

/// A participant's credit standing
#[odra::odra_type]
pub struct CreditProfile {
    /// Profile owner
    pub account: Address,
    /// Current score
    pub score: u16,
    /// Number of loans repaid in full
    pub completed_loans: u32,
    /// Number of loans defaulted
    pub defaulted_loans: u32,
}

/// Coarse rating derived from a score
#[odra::odra_type]
pub enum CreditTier {
    /// No settled loans yet
    Unrated,
    /// Score below 450
    Poor,
    /// Score 450 to 649
    Fair,
    /// Score 650 to 799
    Good,
    /// Score 800 and above
    Excellent,
}

impl CreditTier {
    /// Tier for a given score
    pub fn from_score(score: u16) -> CreditTier {
        if score >= 800 {
            CreditTier::Excellent
        } else if score >= 650 {
            CreditTier::Good
        } else if score >= 450 {
            CreditTier::Fair
        } else {
            CreditTier::Poor
        }
    }
}

/// Credit Score Engine contract
#[odra::module]
pub struct CreditScoreEngine {
    /// Profiles by address
    profiles: Mapping<Address, CreditProfile>,

    /// Score parameters
    params: Var<CreditParams>,

    /// Marketplace allowed to record settlements
    marketplace: Var<Address>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl CreditScoreEngine {
    /// Initialize the engine with default parameters
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.params.set(CreditParams {
            baseline: 500,
            min_score: 0,
            max_score: 1000,
            completion_reward: 25,
            default_penalty: 100,
        });
    }

    /// Set the marketplace address (admin only)
    pub fn set_marketplace(&mut self, marketplace: Address) {
        self.only_admin();
        self.marketplace.set(marketplace);
    }

    // ========================================
    // Settlement Hooks (marketplace only)
    // ========================================

    /// Record a completed loan for a borrower
    pub fn on_loan_completed(&mut self, account: Address) {
        self.only_marketplace();

        let params = self
            .params
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let mut profile = self.profile_or_baseline(account, &params);
        let old_score = profile.score;

        let raised = profile.score.saturating_add(params.completion_reward);
        profile.score = if raised > params.max_score {
            params.max_score
        } else {
            raised
        };
        profile.completed_loans += 1;
        self.profiles.set(&account, profile.clone());

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CreditScoreUpdated {
            account,
            old_score,
            new_score: profile.score,
            completed_loans: profile.completed_loans,
            defaulted_loans: profile.defaulted_loans,
            timestamp,
        });
    }

    /// Record a defaulted loan for a borrower
    ///
    /// The base penalty grows linearly with overdue time, up to double at a
    /// full extra term.
    pub fn on_loan_defaulted(&mut self, account: Address, overdue_ms: u64, duration_ms: u64) {
        self.only_marketplace();

        let params = self
            .params
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        let mut profile = self.profile_or_baseline(account, &params);
        let old_score = profile.score;

        let penalty = scaled_penalty(params.default_penalty, overdue_ms, duration_ms);
        let lowered = profile.score.saturating_sub(penalty);
        profile.score = if lowered < params.min_score {
            params.min_score
        } else {
            lowered
        };
        profile.defaulted_loans += 1;
        self.profiles.set(&account, profile.clone());

        let timestamp = self.env().get_block_time();
        self.env().emit_event(CreditScoreUpdated {
            account,
            old_score,
            new_score: profile.score,
            completed_loans: profile.completed_loans,
            defaulted_loans: profile.defaulted_loans,
            timestamp,
        });
    }

    // ========================================
    // Views
    // ========================================

    /// A participant's profile, the baseline when no history exists
    pub fn credit_profile(&self, account: Address) -> CreditProfile {
        let params = self
            .params
            .get_or_revert_with(ProtocolError::InvalidConfiguration);
        self.profile_or_baseline(account, &params)
    }

    /// A participant's tier, Unrated until a loan settles
    pub fn tier_of(&self, account: Address) -> CreditTier {
        match self.profiles.get(&account) {
            Some(profile) => CreditTier::from_score(profile.score),
            None => CreditTier::Unrated,
        }
    }

    /// Get the score parameters
    pub fn get_params(&self) -> CreditParams {
        self.params
            .get_or_revert_with(ProtocolError::InvalidConfiguration)
    }

    /// Update the score parameters (admin only)
    pub fn set_params(&mut self, params: CreditParams) {
        self.only_admin();
        params.validate().unwrap_or_revert(&self.env());

        self.params.set(params.clone());

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(CreditParamsUpdated {
            baseline: params.baseline,
            min_score: params.min_score,
            max_score: params.max_score,
            completion_reward: params.completion_reward,
            default_penalty: params.default_penalty,
            updated_by: admin,
        });
    }

    // ========================================
    // Internals
    // ========================================

    fn profile_or_baseline(&self, account: Address, params: &CreditParams) -> CreditProfile {
        self.profiles.get(&account).unwrap_or(CreditProfile {
            account,
            score: params.baseline,
            completed_loans: 0,
            defaulted_loans: 0,
        })
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

/// Penalty for a default, growing linearly from the base to twice the base
/// as overdue time approaches a full term
fn scaled_penalty(base: u16, overdue_ms: u64, duration_ms: u64) -> u16 {
    if duration_ms == 0 {
        return base;
    }
    let overdue = if overdue_ms > duration_ms {
        duration_ms
    } else {
        overdue_ms
    };
    let extra = (base as u64 * overdue) / duration_ms;
    base.saturating_add(extra as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        assert!(matches!(CreditTier::from_score(0), CreditTier::Poor));
        assert!(matches!(CreditTier::from_score(449), CreditTier::Poor));
        assert!(matches!(CreditTier::from_score(450), CreditTier::Fair));
        assert!(matches!(CreditTier::from_score(649), CreditTier::Fair));
        assert!(matches!(CreditTier::from_score(650), CreditTier::Good));
        assert!(matches!(CreditTier::from_score(799), CreditTier::Good));
        assert!(matches!(CreditTier::from_score(800), CreditTier::Excellent));
        assert!(matches!(CreditTier::from_score(1000), CreditTier::Excellent));
    }

    #[test]
    fn test_scaled_penalty() {
        let duration = 1_000_000u64;
        // Not yet overdue: base penalty
        assert_eq!(scaled_penalty(100, 0, duration), 100);
        // Half a term overdue: 1.5x
        assert_eq!(scaled_penalty(100, duration / 2, duration), 150);
        // A full term or more overdue: capped at 2x
        assert_eq!(scaled_penalty(100, duration, duration), 200);
        assert_eq!(scaled_penalty(100, duration * 5, duration), 200);
    }

    #[test]
    fn test_params_validation() {
        let bad = CreditParams {
            baseline: 1200,
            min_score: 0,
            max_score: 1000,
            completion_reward: 25,
            default_penalty: 100,
        };
        assert!(matches!(
            bad.validate(),
            Err(ProtocolError::InvalidConfiguration)
        ));

        let inverted = CreditParams {
            baseline: 500,
            min_score: 800,
            max_score: 200,
            completion_reward: 25,
            default_penalty: 100,
        };
        assert!(matches!(
            inverted.validate(),
            Err(ProtocolError::InvalidConfiguration)
        ));
    }
}
