//! Notifications emitted on every successful mutation

use serde::{Deserialize, Serialize};

use crate::types::{decimal, AccountId, Amount, Hash, Timestamp};

/// Ledger event for indexers and challengers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    /// A root was appended
    #[serde(rename_all = "camelCase")]
    StateSubmitted {
        index: usize,
        #[serde(with = "hex")]
        root: Hash,
        timestamp: Timestamp,
    },
    /// A transaction replaced a record's root
    #[serde(rename_all = "camelCase")]
    StateTransitioned {
        index: usize,
        #[serde(with = "hex")]
        previous_root: Hash,
        #[serde(with = "hex")]
        new_root: Hash,
        #[serde(with = "hex")]
        tx_hash: Hash,
        #[serde(with = "decimal")]
        amount: Amount,
        timestamp: Timestamp,
    },
    /// A challenge was opened
    #[serde(rename_all = "camelCase")]
    StateChallenged {
        index: usize,
        #[serde(with = "hex")]
        challenger: AccountId,
    },
    /// A challenge was settled
    #[serde(rename_all = "camelCase")]
    ChallengeResolved {
        index: usize,
        #[serde(with = "hex")]
        resolver: AccountId,
        fraudulent: bool,
    },
    /// Value entered the deposit ledger
    DepositRecorded {
        #[serde(with = "hex")]
        account: AccountId,
        #[serde(with = "decimal")]
        amount: Amount,
        #[serde(with = "decimal")]
        balance: Amount,
    },
    /// Value left the deposit ledger
    WithdrawalRecorded {
        #[serde(with = "hex")]
        account: AccountId,
        #[serde(with = "decimal")]
        amount: Amount,
        #[serde(with = "decimal")]
        balance: Amount,
    },
}

impl LedgerEvent {
    /// State index the event refers to, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::StateSubmitted { index, .. }
            | Self::StateTransitioned { index, .. }
            | Self::StateChallenged { index, .. }
            | Self::ChallengeResolved { index, .. } => Some(*index),
            Self::DepositRecorded { .. } | Self::WithdrawalRecorded { .. } => None,
        }
    }
}
