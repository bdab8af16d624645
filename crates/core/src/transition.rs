//! State transition function
//!
//! Moves `amount` from the sender leaf to the recipient leaf. Both leaves must
//! be proven against the same prior root before anything is recomputed.

use serde::{Deserialize, Serialize};

use rollup_merkle::{compute_root, verify_proof};

use crate::codec::{decode_transaction, encode_leaf, Transaction};
use crate::error::{ProofSubject, Result, RollupError};
use crate::types::{decimal, Amount, Hash};

/// Outcome of a verified transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Decoded transaction
    pub transaction: Transaction,
    /// Root both proofs were checked against
    #[serde(with = "hex")]
    pub previous_root: Hash,
    /// Root over the two updated leaves
    #[serde(with = "hex")]
    pub new_root: Hash,
    /// Sender balance after the transfer
    #[serde(with = "decimal")]
    pub sender_balance_after: Amount,
    /// Recipient balance after the transfer
    #[serde(with = "decimal")]
    pub recipient_balance_after: Amount,
}

/// Apply a transfer payload to `current_root`.
///
/// The new root is computed over the updated `[sender, recipient]` leaf pair.
/// The function is pure; committing the root is the caller's job.
pub fn apply_transaction(
    current_root: &Hash,
    payload: &[u8],
    proof_sender: &[Hash],
    proof_recipient: &[Hash],
    sender_balance_before: Amount,
    recipient_balance_before: Amount,
) -> Result<Transition> {
    let transaction = decode_transaction(payload)?;
    if transaction.sender == transaction.recipient {
        return Err(RollupError::SelfTransfer);
    }

    let sender_leaf = encode_leaf(&transaction.sender, sender_balance_before);
    let recipient_leaf = encode_leaf(&transaction.recipient, recipient_balance_before);

    if !verify_proof(proof_sender, current_root, &sender_leaf) {
        return Err(RollupError::InvalidProof { subject: ProofSubject::Sender });
    }
    if !verify_proof(proof_recipient, current_root, &recipient_leaf) {
        return Err(RollupError::InvalidProof { subject: ProofSubject::Recipient });
    }

    if sender_balance_before < transaction.amount {
        return Err(RollupError::InsufficientBalance {
            required: transaction.amount,
            available: sender_balance_before,
        });
    }

    let sender_balance_after = sender_balance_before - transaction.amount;
    let recipient_balance_after = recipient_balance_before
        .checked_add(transaction.amount)
        .ok_or(RollupError::BalanceOverflow)?;

    let new_root = compute_root(&[
        encode_leaf(&transaction.sender, sender_balance_after),
        encode_leaf(&transaction.recipient, recipient_balance_after),
    ])?;

    Ok(Transition {
        transaction,
        previous_root: *current_root,
        new_root,
        sender_balance_after,
        recipient_balance_after,
    })
}
