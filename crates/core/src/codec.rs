//! Account leaf and transaction payload encoding
//!
//! Both encodings are part of the cross-node contract: any node must derive
//! bit-identical leaves and decode identical transactions from the same bytes.
//!
//! Leaf: `keccak256(0x00 || account || balance)` with the balance as a 32-byte
//! big-endian word.
//!
//! Payload: three 32-byte words, `sender || recipient || amount`, the amount a
//! big-endian uint256 that must fit in 128 bits.

use serde::{Deserialize, Serialize};

use rollup_merkle::Keccak256Hasher;

use crate::types::{decimal, AccountId, Amount, Hash};

/// Size of one encoded word
const WORD: usize = 32;

/// Size of an encoded transaction payload
pub const PAYLOAD_LEN: usize = 3 * WORD;

/// Payload decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Payload is not exactly three words
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    /// Amount word does not fit in 128 bits
    #[error("amount exceeds 128 bits")]
    AmountOutOfRange,
}

/// Encode a balance as a 32-byte big-endian word
fn balance_word(balance: Amount) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&balance.to_be_bytes());
    word
}

/// Commit to an account and its balance
pub fn encode_leaf(account: &AccountId, balance: Amount) -> Hash {
    Keccak256Hasher::hash_leaf(account, &balance_word(balance))
}

/// Transfer between two rollup accounts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender account
    #[serde(with = "hex")]
    pub sender: AccountId,
    /// Recipient account
    #[serde(with = "hex")]
    pub recipient: AccountId,
    /// Amount to move
    #[serde(with = "decimal")]
    pub amount: Amount,
}

impl Transaction {
    /// Create a new transfer
    pub fn new(sender: AccountId, recipient: AccountId, amount: Amount) -> Self {
        Self {
            sender,
            recipient,
            amount,
        }
    }

    /// Canonical payload bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.extend_from_slice(&self.sender);
        payload.extend_from_slice(&self.recipient);
        payload.extend_from_slice(&balance_word(self.amount));
        payload
    }

    /// Keccak256 of the canonical payload
    pub fn hash(&self) -> Hash {
        Keccak256Hasher::hash(&self.encode())
    }
}

/// Decode a payload into a transaction
pub fn decode_transaction(payload: &[u8]) -> Result<Transaction, PayloadError> {
    if payload.len() != PAYLOAD_LEN {
        return Err(PayloadError::WrongLength {
            expected: PAYLOAD_LEN,
            actual: payload.len(),
        });
    }

    let (sender, rest) = payload.split_at(WORD);
    let (recipient, amount) = rest.split_at(WORD);

    let (high, low) = amount.split_at(WORD - 16);
    if high.iter().any(|b| *b != 0) {
        return Err(PayloadError::AmountOutOfRange);
    }

    let mut sender_id = [0u8; WORD];
    sender_id.copy_from_slice(sender);
    let mut recipient_id = [0u8; WORD];
    recipient_id.copy_from_slice(recipient);
    let mut amount_bytes = [0u8; 16];
    amount_bytes.copy_from_slice(low);

    Ok(Transaction {
        sender: sender_id,
        recipient: recipient_id,
        amount: u128::from_be_bytes(amount_bytes),
    })
}
