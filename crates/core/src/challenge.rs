//! Challenge and fraud-proof protocol
//!
//! ```text
//! Submitted --challenge--> Challenged --resolve(fraud=false)--> Submitted
//!                                     --resolve(fraud=true)---> Invalidated
//! ```
//!
//! Resolution must present a leaf and sibling path that verify against the
//! disputed root. A bare assertion from either side settles nothing.

use rollup_merkle::verify_proof;

use crate::error::{ProofSubject, Result, RollupError};
use crate::ledger::StateLedger;
use crate::types::Hash;

/// How a challenge ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Challenge dismissed; transitions resume
    Cleared,
    /// Fraud proven; record frozen
    Invalidated,
}

impl StateLedger {
    /// Open a challenge against the record at `index`
    pub fn challenge(&mut self, index: usize) -> Result<()> {
        let record = self.get_state_mut(index)?;
        if !record.valid {
            return Err(RollupError::StateFrozen { index });
        }
        if record.challenged {
            return Err(RollupError::AlreadyChallenged { index });
        }

        record.challenged = true;
        Ok(())
    }

    /// Settle the open challenge on `index` with `leaf` proven by `proof`
    pub fn resolve(
        &mut self,
        index: usize,
        proof: &[Hash],
        leaf: &Hash,
        fraud_asserted: bool,
    ) -> Result<Resolution> {
        let record = self.get_state_mut(index)?;
        if !record.valid {
            return Err(RollupError::StateFrozen { index });
        }
        if !record.challenged {
            return Err(RollupError::NotChallenged { index });
        }
        if !verify_proof(proof, &record.root, leaf) {
            return Err(RollupError::InvalidProof { subject: ProofSubject::Resolution });
        }

        record.challenged = false;
        if fraud_asserted {
            record.valid = false;
            Ok(Resolution::Invalidated)
        } else {
            Ok(Resolution::Cleared)
        }
    }
}
