//! Error types

use std::fmt;

use rollup_merkle::MerkleError;

use crate::codec::PayloadError;
use crate::deposit::VaultError;
use crate::types::Amount;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RollupError>;

/// Which leaf failed proof verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofSubject {
    /// Sender leaf of a transaction
    Sender,
    /// Recipient leaf of a transaction
    Recipient,
    /// Leaf offered as evidence when resolving a challenge
    Resolution,
}

impl fmt::Display for ProofSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Recipient => f.write_str("recipient"),
            Self::Resolution => f.write_str("resolution"),
        }
    }
}

/// Error categories, used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retry with corrected arguments
    Validation,
    /// Merkle verification failed; stale root or fraud attempt
    Proof,
    /// Operation not allowed in the record's current state
    State,
    /// Balance would go negative or overflow
    Conservation,
    /// The external value vault refused the transfer
    External,
}

/// Rollup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollupError {
    /// No record at this index
    #[error("state index {index} out of range (ledger length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Transaction payload does not match the fixed layout
    #[error("malformed transaction payload: {0}")]
    MalformedPayload(#[from] PayloadError),

    /// Zero-value deposit or withdrawal
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Sender and recipient are the same account
    #[error("sender and recipient must differ")]
    SelfTransfer,

    /// Merkle proof did not verify against the record root
    #[error("invalid {subject} proof")]
    InvalidProof { subject: ProofSubject },

    /// Record is challenged or invalidated
    #[error("state {index} is not mutable")]
    StateNotMutable { index: usize },

    /// Record was invalidated by a fraud resolution
    #[error("state {index} is frozen")]
    StateFrozen { index: usize },

    /// Record already has an open challenge
    #[error("state {index} is already challenged")]
    AlreadyChallenged { index: usize },

    /// Resolution requested without an open challenge
    #[error("state {index} has no open challenge")]
    NotChallenged { index: usize },

    /// Caller is not the configured resolver
    #[error("caller is not the configured resolver")]
    UnauthorizedResolver,

    /// Balance lower than the amount moved
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    /// Credit would overflow the balance type
    #[error("balance overflow")]
    BalanceOverflow,

    /// Merkle engine error
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// External value vault error
    #[error("vault: {0}")]
    Vault(#[from] VaultError),
}

impl RollupError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndexOutOfRange { .. }
            | Self::MalformedPayload(_)
            | Self::ZeroAmount
            | Self::SelfTransfer
            | Self::Merkle(_) => ErrorKind::Validation,
            Self::InvalidProof { .. } => ErrorKind::Proof,
            Self::StateNotMutable { .. }
            | Self::StateFrozen { .. }
            | Self::AlreadyChallenged { .. }
            | Self::NotChallenged { .. }
            | Self::UnauthorizedResolver => ErrorKind::State,
            Self::InsufficientBalance { .. } | Self::BalanceOverflow => ErrorKind::Conservation,
            Self::Vault(_) => ErrorKind::External,
        }
    }
}
