//! Optimistic rollup state commitment ledger
//!
//! This crate contains the single-writer state machine every node must
//! reproduce identically:
//! - Account leaf and transaction payload codec
//! - The proof-checked two-account state transition function
//! - An append-only ledger of state roots with a challenge/fraud-proof protocol
//! - A deposit/withdrawal ledger backed by an external value vault

pub mod challenge;
pub mod clock;
pub mod codec;
pub mod config;
pub mod deposit;
pub mod error;
pub mod events;
pub mod ledger;
pub mod rollup;
pub mod transition;
pub mod types;

pub use challenge::Resolution;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{decode_transaction, encode_leaf, PayloadError, Transaction, PAYLOAD_LEN};
pub use config::RollupConfig;
pub use deposit::{DepositLedger, InMemoryVault, ValueVault, VaultError};
pub use error::{ErrorKind, ProofSubject, Result, RollupError};
pub use events::LedgerEvent;
pub use ledger::{RecordStatus, StateLedger, StateRecord, TransactionRequest};
pub use rollup::Rollup;
pub use transition::{apply_transaction, Transition};
pub use types::*;
