//! Single-writer rollup: state ledger, challenges and deposits behind one API

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::challenge::Resolution;
use crate::clock::{Clock, SystemClock};
use crate::config::RollupConfig;
use crate::deposit::{DepositLedger, InMemoryVault, ValueVault};
use crate::error::{Result, RollupError};
use crate::events::LedgerEvent;
use crate::ledger::{RecordStatus, StateLedger, StateRecord, TransactionRequest};
use crate::transition::Transition;
use crate::types::{short_hex, AccountId, Amount, Hash, Timestamp};

/// Rollup state machine.
///
/// Every operation takes `&mut self` and checks all preconditions before
/// mutating, so a failed call leaves no trace.
#[derive(Debug)]
pub struct Rollup<C = SystemClock, V = InMemoryVault> {
    config: RollupConfig,
    clock: C,
    ledger: StateLedger,
    deposits: DepositLedger,
    vault: V,
    events: VecDeque<LedgerEvent>,
    /// Sequence number of `events.front()`
    first_event_seq: u64,
}

impl Rollup {
    /// Rollup on the wall clock with an empty in-memory vault
    pub fn new(config: RollupConfig) -> Self {
        Self::with_parts(config, SystemClock, InMemoryVault::new())
    }
}

impl<C: Clock, V: ValueVault> Rollup<C, V> {
    /// Assemble a rollup from its collaborators
    pub fn with_parts(config: RollupConfig, clock: C, vault: V) -> Self {
        Self {
            config,
            clock,
            ledger: StateLedger::new(),
            deposits: DepositLedger::new(),
            vault,
            events: VecDeque::new(),
            first_event_seq: 0,
        }
    }

    /// Post a new root; accepted optimistically
    pub fn submit_state(&mut self, root: Hash) -> usize {
        let timestamp = self.clock.now();
        let index = self.ledger.submit_state(root, timestamp);

        info!("State {} submitted: root={}", index, short_hex(&root));
        self.emit(LedgerEvent::StateSubmitted {
            index,
            root,
            timestamp,
        });
        index
    }

    /// Record at `index`
    pub fn get_state(&self, index: usize) -> Result<&StateRecord> {
        self.ledger.get_state(index)
    }

    /// Apply a proven transfer to the record at `index`
    pub fn process_transaction(
        &mut self,
        index: usize,
        request: &TransactionRequest,
    ) -> Result<Transition> {
        let timestamp = self.clock.now();
        let transition = self
            .ledger
            .process_transaction(index, request, timestamp)
            .inspect_err(|e| warn!("Transaction on state {} rejected: {}", index, e))?;

        let tx_hash = transition.transaction.hash();
        info!(
            "State {} transitioned: {} -> {}, tx={}, amount={}",
            index,
            short_hex(&transition.previous_root),
            short_hex(&transition.new_root),
            short_hex(&tx_hash),
            transition.transaction.amount,
        );
        self.emit(LedgerEvent::StateTransitioned {
            index,
            previous_root: transition.previous_root,
            new_root: transition.new_root,
            tx_hash,
            amount: transition.transaction.amount,
            timestamp,
        });
        Ok(transition)
    }

    /// Open a challenge on the record at `index`
    pub fn challenge_state(&mut self, challenger: &AccountId, index: usize) -> Result<()> {
        self.ledger
            .challenge(index)
            .inspect_err(|e| warn!("Challenge on state {} rejected: {}", index, e))?;

        info!("State {} challenged by {}", index, short_hex(challenger));
        self.emit(LedgerEvent::StateChallenged {
            index,
            challenger: *challenger,
        });
        Ok(())
    }

    /// Settle the open challenge on `index` with a leaf proven against its root
    pub fn resolve_challenge(
        &mut self,
        resolver: &AccountId,
        index: usize,
        proof: &[Hash],
        leaf: &Hash,
        fraud_asserted: bool,
    ) -> Result<Resolution> {
        if !self.config.may_resolve(resolver) {
            warn!("Resolution of state {} by {} refused", index, short_hex(resolver));
            return Err(RollupError::UnauthorizedResolver);
        }

        let resolution = self
            .ledger
            .resolve(index, proof, leaf, fraud_asserted)
            .inspect_err(|e| warn!("Resolution of state {} rejected: {}", index, e))?;

        match resolution {
            Resolution::Cleared => info!("State {} cleared", index),
            Resolution::Invalidated => warn!("State {} invalidated: fraud proven", index),
        }
        self.emit(LedgerEvent::ChallengeResolved {
            index,
            resolver: *resolver,
            fraudulent: resolution == Resolution::Invalidated,
        });
        Ok(resolution)
    }

    /// Move `amount` of external value into `caller`'s deposit balance
    pub fn deposit(&mut self, caller: &AccountId, amount: Amount) -> Result<Amount> {
        let balance = self.deposits.deposit(&mut self.vault, caller, amount)?;

        info!("Deposit: account={}, amount={}, balance={}", short_hex(caller), amount, balance);
        self.emit(LedgerEvent::DepositRecorded {
            account: *caller,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Pay `amount` out of `caller`'s deposit balance
    pub fn withdraw(&mut self, caller: &AccountId, amount: Amount) -> Result<Amount> {
        let balance = self.deposits.withdraw(&mut self.vault, caller, amount)?;

        info!("Withdrawal: account={}, amount={}, balance={}", short_hex(caller), amount, balance);
        self.emit(LedgerEvent::WithdrawalRecorded {
            account: *caller,
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Configured dispute window in seconds
    pub fn challenge_window(&self) -> u64 {
        self.config.challenge_window_secs
    }

    /// Valid, unchallenged and past the dispute window
    pub fn is_finalized(&self, index: usize) -> Result<bool> {
        self.ledger
            .is_finalized(index, self.clock.now(), self.config.challenge_window_secs)
    }

    /// Dispute status of the record at `index`
    pub fn status(&self, index: usize) -> Result<RecordStatus> {
        self.ledger.status(index)
    }

    /// Recorded deposit balance of `account`
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.deposits.balance_of(account)
    }

    /// Value held against deposit balances
    pub fn reserve(&self) -> Amount {
        self.deposits.reserve()
    }

    /// Current time as seen by the rollup
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The state ledger
    pub fn ledger(&self) -> &StateLedger {
        &self.ledger
    }

    /// The configuration
    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    /// The external value vault
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Mutable access to the vault, e.g. to fund external wallets
    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    /// Retained events, oldest first
    pub fn events(&self) -> &VecDeque<LedgerEvent> {
        &self.events
    }

    /// Sequence number of the oldest retained event
    pub fn first_event_seq(&self) -> u64 {
        self.first_event_seq
    }

    /// Sequence number the next event will get
    pub fn next_event_seq(&self) -> u64 {
        self.first_event_seq + self.events.len() as u64
    }

    /// Retained events numbered `seq` and later, paired with their numbers.
    ///
    /// A cursor older than the retained window starts at the oldest event.
    pub fn events_since(&self, seq: u64) -> impl Iterator<Item = (u64, &LedgerEvent)> + '_ {
        let skip = seq.saturating_sub(self.first_event_seq);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        (self.first_event_seq..).zip(&self.events).skip(skip)
    }

    /// Take all retained events
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.first_event_seq += self.events.len() as u64;
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: LedgerEvent) {
        debug!(?event, "ledger event");
        self.events.push_back(event);
        while self.events.len() > self.config.max_events.max(1) {
            self.events.pop_front();
            self.first_event_seq += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::codec::{encode_leaf, Transaction};
    use rollup_merkle::MerkleTree;

    const ALICE: AccountId = [1u8; 32];
    const BOB: AccountId = [2u8; 32];
    const JUDGE: AccountId = [9u8; 32];

    fn rollup(config: RollupConfig) -> (Rollup<ManualClock, InMemoryVault>, ManualClock) {
        let clock = ManualClock::new(1_000);
        let mut vault = InMemoryVault::new();
        vault.fund(ALICE, 500);
        (Rollup::with_parts(config, clock.clone(), vault), clock)
    }

    #[test]
    fn test_submit_emits_event() {
        let (mut rollup, _) = rollup(RollupConfig::default());
        let index = rollup.submit_state([7u8; 32]);

        assert_eq!(index, 0);
        assert_eq!(
            rollup.events(),
            &[LedgerEvent::StateSubmitted {
                index: 0,
                root: [7u8; 32],
                timestamp: 1_000
            }]
        );
        assert_eq!(rollup.drain_events().len(), 1);
        assert!(rollup.events().is_empty());
    }

    #[test]
    fn test_transaction_refreshes_timestamp() {
        let (mut rollup, clock) = rollup(RollupConfig::default());
        let tree =
            MerkleTree::new(vec![encode_leaf(&ALICE, 100), encode_leaf(&BOB, 0)]).unwrap();
        let index = rollup.submit_state(tree.root());
        clock.advance(30);

        let request = TransactionRequest {
            payload: Transaction::new(ALICE, BOB, 40).encode(),
            proof_sender: tree.proof(0).unwrap().siblings,
            proof_recipient: tree.proof(1).unwrap().siblings,
            sender_balance_before: 100,
            recipient_balance_before: 0,
        };
        let transition = rollup.process_transaction(index, &request).unwrap();

        let record = rollup.get_state(index).unwrap();
        assert_eq!(record.timestamp, 1_030);
        assert_eq!(record.root, transition.new_root);
        assert!(matches!(
            rollup.events().back(),
            Some(LedgerEvent::StateTransitioned { amount: 40, .. })
        ));
    }

    #[test]
    fn test_failed_operation_emits_nothing() {
        let (mut rollup, _) = rollup(RollupConfig::default());
        rollup.submit_state([7u8; 32]);
        rollup.drain_events();

        assert!(rollup.challenge_state(&BOB, 3).is_err());
        assert!(rollup.withdraw(&ALICE, 1).is_err());
        assert!(rollup.events().is_empty());
    }

    #[test]
    fn test_privileged_resolver() {
        let (mut rollup, _) = rollup(RollupConfig::default().with_resolver(JUDGE));
        let tree = MerkleTree::new(vec![encode_leaf(&ALICE, 0)]).unwrap();
        let index = rollup.submit_state(tree.root());
        rollup.challenge_state(&BOB, index).unwrap();

        let leaf = tree.leaves()[0];
        assert_eq!(
            rollup.resolve_challenge(&BOB, index, &[], &leaf, true).unwrap_err(),
            RollupError::UnauthorizedResolver
        );
        assert_eq!(
            rollup.resolve_challenge(&JUDGE, index, &[], &leaf, false).unwrap(),
            Resolution::Cleared
        );
    }

    #[test]
    fn test_finality_follows_window() {
        let (mut rollup, clock) = rollup(RollupConfig::default().with_challenge_window(60));
        let index = rollup.submit_state([7u8; 32]);

        assert_eq!(rollup.challenge_window(), 60);
        assert!(!rollup.is_finalized(index).unwrap());
        clock.advance(60);
        assert!(rollup.is_finalized(index).unwrap());
    }

    #[test]
    fn test_event_log_is_bounded() {
        let (mut rollup, _) = rollup(RollupConfig::default().with_max_events(3));
        for i in 0..5u8 {
            rollup.submit_state([i; 32]);
        }

        assert_eq!(rollup.events().len(), 3);
        assert_eq!(rollup.first_event_seq(), 2);
        assert_eq!(rollup.next_event_seq(), 5);
        assert_eq!(rollup.events().front().and_then(LedgerEvent::index), Some(2));

        // Stale cursors restart at the oldest retained event
        let seqs: Vec<u64> = rollup.events_since(0).map(|(seq, _)| seq).collect();
        assert_eq!(seqs, [2, 3, 4]);
        let tail: Vec<Option<usize>> =
            rollup.events_since(4).map(|(_, e)| e.index()).collect();
        assert_eq!(tail, [Some(4)]);
        assert_eq!(rollup.events_since(9).count(), 0);
    }

    #[test]
    fn test_drain_advances_sequence() {
        let (mut rollup, _) = rollup(RollupConfig::default());
        rollup.submit_state([1u8; 32]);
        rollup.submit_state([2u8; 32]);

        assert_eq!(rollup.drain_events().len(), 2);
        assert_eq!(rollup.first_event_seq(), 2);
        rollup.submit_state([3u8; 32]);
        assert_eq!(rollup.events_since(2).map(|(seq, _)| seq).collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn test_deposit_withdraw_events() {
        let (mut rollup, _) = rollup(RollupConfig::default());
        assert_eq!(rollup.deposit(&ALICE, 200).unwrap(), 200);
        assert_eq!(rollup.withdraw(&ALICE, 50).unwrap(), 150);

        assert_eq!(rollup.reserve(), 150);
        assert_eq!(rollup.vault().wallet_balance(&ALICE), 350);
        assert_eq!(
            rollup.events(),
            &[
                LedgerEvent::DepositRecorded { account: ALICE, amount: 200, balance: 200 },
                LedgerEvent::WithdrawalRecorded { account: ALICE, amount: 50, balance: 150 },
            ]
        );
    }
}
