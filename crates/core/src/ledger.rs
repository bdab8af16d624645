//! Append-only ledger of committed state roots

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollupError};
use crate::transition::{apply_transaction, Transition};
use crate::types::{Amount, Hash, Timestamp};

/// One committed state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Commitment over the off-chain account set
    #[serde(with = "hex")]
    pub root: Hash,
    /// Submission time, refreshed by every applied transaction
    pub timestamp: Timestamp,
    /// An unresolved challenge is open
    pub challenged: bool,
    /// False once a challenge proved fraud; the record is frozen for good
    pub valid: bool,
}

impl StateRecord {
    /// Fresh record for a newly submitted root
    pub fn new(root: Hash, timestamp: Timestamp) -> Self {
        Self {
            root,
            timestamp,
            challenged: false,
            valid: true,
        }
    }

    /// Dispute status derived from the flags
    pub fn status(&self) -> RecordStatus {
        if !self.valid {
            RecordStatus::Invalidated
        } else if self.challenged {
            RecordStatus::Challenged
        } else {
            RecordStatus::Submitted
        }
    }

    /// Transactions may only target valid, unchallenged records
    pub fn is_mutable(&self) -> bool {
        self.valid && !self.challenged
    }
}

/// Dispute status of a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Accepted optimistically, or cleared after a challenge
    Submitted,
    /// Challenge open; transitions paused
    Challenged,
    /// Fraud proven; terminal
    Invalidated,
}

/// Inputs for applying one transfer to a record
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Encoded transaction, see [`crate::codec`]
    pub payload: Vec<u8>,
    /// Sibling path for the sender leaf
    pub proof_sender: Vec<Hash>,
    /// Sibling path for the recipient leaf
    pub proof_recipient: Vec<Hash>,
    /// Claimed sender balance under the current root
    pub sender_balance_before: Amount,
    /// Claimed recipient balance under the current root
    pub recipient_balance_before: Amount,
}

/// Index-addressed, append-only sequence of state records
#[derive(Clone, Debug, Default)]
pub struct StateLedger {
    records: Vec<StateRecord>,
}

impl StateLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root without validating it; returns its index
    pub fn submit_state(&mut self, root: Hash, now: Timestamp) -> usize {
        self.records.push(StateRecord::new(root, now));
        self.records.len() - 1
    }

    /// Get the record at `index`
    pub fn get_state(&self, index: usize) -> Result<&StateRecord> {
        self.records.get(index).ok_or(RollupError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    pub(crate) fn get_state_mut(&mut self, index: usize) -> Result<&mut StateRecord> {
        let len = self.records.len();
        self.records
            .get_mut(index)
            .ok_or(RollupError::IndexOutOfRange { index, len })
    }

    /// Apply a transfer to the record at `index`, replacing its root
    pub fn process_transaction(
        &mut self,
        index: usize,
        request: &TransactionRequest,
        now: Timestamp,
    ) -> Result<Transition> {
        let record = self.get_state_mut(index)?;
        if !record.is_mutable() {
            return Err(RollupError::StateNotMutable { index });
        }

        let transition = apply_transaction(
            &record.root,
            &request.payload,
            &request.proof_sender,
            &request.proof_recipient,
            request.sender_balance_before,
            request.recipient_balance_before,
        )?;

        record.root = transition.new_root;
        record.timestamp = now;
        Ok(transition)
    }

    /// Dispute status of the record at `index`
    pub fn status(&self, index: usize) -> Result<RecordStatus> {
        self.get_state(index).map(StateRecord::status)
    }

    /// A record is final once it is valid, unchallenged and older than `window`
    pub fn is_finalized(&self, index: usize, now: Timestamp, window: u64) -> Result<bool> {
        let record = self.get_state(index)?;
        Ok(record.is_mutable() && now >= record.timestamp.saturating_add(window))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been submitted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recently submitted record
    pub fn latest(&self) -> Option<&StateRecord> {
        self.records.last()
    }

    /// All records in submission order
    pub fn records(&self) -> &[StateRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_leaf, Transaction};
    use rollup_merkle::MerkleTree;

    const ALICE: [u8; 32] = [1u8; 32];
    const BOB: [u8; 32] = [2u8; 32];

    fn funded_tree() -> MerkleTree {
        MerkleTree::new(vec![encode_leaf(&ALICE, 100), encode_leaf(&BOB, 0)]).unwrap()
    }

    fn transfer(tree: &MerkleTree, amount: Amount) -> TransactionRequest {
        TransactionRequest {
            payload: Transaction::new(ALICE, BOB, amount).encode(),
            proof_sender: tree.proof(0).unwrap().siblings,
            proof_recipient: tree.proof(1).unwrap().siblings,
            sender_balance_before: 100,
            recipient_balance_before: 0,
        }
    }

    #[test]
    fn test_submit_and_get() {
        let mut ledger = StateLedger::new();
        assert!(ledger.is_empty());

        assert_eq!(ledger.submit_state([1u8; 32], 10), 0);
        assert_eq!(ledger.submit_state([2u8; 32], 11), 1);

        let record = ledger.get_state(1).unwrap();
        assert_eq!(record.root, [2u8; 32]);
        assert_eq!(record.timestamp, 11);
        assert!(!record.challenged);
        assert!(record.valid);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().unwrap().root, [2u8; 32]);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut ledger = StateLedger::new();
        ledger.submit_state([1u8; 32], 0);
        assert_eq!(
            ledger.get_state(1).unwrap_err(),
            RollupError::IndexOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn test_process_replaces_root_and_timestamp() {
        let tree = funded_tree();
        let mut ledger = StateLedger::new();
        let index = ledger.submit_state(tree.root(), 5);

        let transition = ledger.process_transaction(index, &transfer(&tree, 40), 9).unwrap();

        let record = ledger.get_state(index).unwrap();
        assert_eq!(record.root, transition.new_root);
        assert_eq!(record.timestamp, 9);
        assert_eq!(transition.sender_balance_after, 60);
        assert_eq!(transition.recipient_balance_after, 40);
    }

    #[test]
    fn test_failed_transaction_leaves_record_untouched() {
        let tree = funded_tree();
        let mut ledger = StateLedger::new();
        let index = ledger.submit_state(tree.root(), 5);

        let err = ledger.process_transaction(index, &transfer(&tree, 101), 9).unwrap_err();
        assert!(matches!(err, RollupError::InsufficientBalance { .. }));
        assert_eq!(ledger.get_state(index).unwrap(), &StateRecord::new(tree.root(), 5));
    }

    #[test]
    fn test_challenged_record_not_mutable() {
        let tree = funded_tree();
        let mut ledger = StateLedger::new();
        let index = ledger.submit_state(tree.root(), 5);
        ledger.get_state_mut(index).unwrap().challenged = true;

        assert_eq!(
            ledger.process_transaction(index, &transfer(&tree, 1), 9).unwrap_err(),
            RollupError::StateNotMutable { index }
        );
    }

    #[test]
    fn test_finality_window() {
        let mut ledger = StateLedger::new();
        let index = ledger.submit_state([1u8; 32], 100);

        assert!(!ledger.is_finalized(index, 150, 100).unwrap());
        assert!(ledger.is_finalized(index, 200, 100).unwrap());

        ledger.get_state_mut(index).unwrap().challenged = true;
        assert!(!ledger.is_finalized(index, 500, 100).unwrap());
        assert_eq!(ledger.status(index).unwrap(), RecordStatus::Challenged);
    }
}
