//! In-memory account state.
//!
//! Every mutator reports the change to the attached [`EvmHooks`] before
//! writing, so consumers see the previous and the new value. No logger, or a
//! logger without the matching hook, means the write happens silently.

use std::sync::Arc;

use bytes::Bytes;
use livetrace_common::constants::EMPTY_CODE_HASH;
use livetrace_common::types::Log;
use livetrace_common::utils::keccak;
use livetrace_common::{Address, H256, U256};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::errors::StateError;
use crate::tracing::{BalanceChangeReason, EvmHooks};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub code_hash: H256,
    pub storage: FxHashMap<H256, H256>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code: Bytes::new(),
            code_hash: EMPTY_CODE_HASH,
            storage: FxHashMap::default(),
        }
    }
}

impl Account {
    pub fn new(balance: U256, code: Bytes, nonce: u64) -> Self {
        Self {
            balance,
            nonce,
            code_hash: keccak(&code),
            code,
            storage: FxHashMap::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StateDb {
    accounts: FxHashMap<Address, Account>,
    logs: Vec<Log>,
    snapshots: Vec<(FxHashMap<Address, Account>, usize)>,
    logger: Option<Arc<EvmHooks>>,
}

impl StateDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = (Address, Account)>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Attaches (or with `None`, detaches) the hooks state changes are reported to.
    pub fn set_logger(&mut self, logger: Option<Arc<EvmHooks>>) {
        self.logger = logger;
    }

    pub fn logger(&self) -> Option<&Arc<EvmHooks>> {
        self.logger.as_ref()
    }

    /// The logger's hook selected by `select`, when both are present. Callers
    /// only compute the previous value once this returns `Some`.
    fn hook<'a, H: ?Sized + 'a>(
        &'a self,
        select: impl FnOnce(&'a EvmHooks) -> Option<&'a Arc<H>>,
    ) -> Option<Arc<H>> {
        self.logger.as_deref().and_then(select).cloned()
    }

    pub fn account(&self, address: Address) -> Option<&Account> {
        self.accounts.get(&address)
    }

    pub fn exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    pub fn get_balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    pub fn get_nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    pub fn get_code(&self, address: Address) -> Bytes {
        self.accounts
            .get(&address)
            .map(|account| account.code.clone())
            .unwrap_or_default()
    }

    pub fn get_code_hash(&self, address: Address) -> H256 {
        self.accounts
            .get(&address)
            .map(|account| account.code_hash)
            .unwrap_or(EMPTY_CODE_HASH)
    }

    pub fn get_code_size(&self, address: Address) -> usize {
        self.accounts
            .get(&address)
            .map(|account| account.code.len())
            .unwrap_or_default()
    }

    pub fn get_state(&self, address: Address, slot: H256) -> H256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let code_hash = keccak(&code);
        if let Some(hook) = self.hook(|logger| logger.on_code_change.as_ref()) {
            let prev_code = self.get_code(address);
            let prev_hash = self.get_code_hash(address);
            hook(address, prev_hash, &prev_code, code_hash, &code);
        }

        let account = self.accounts.entry(address).or_default();
        account.code = code;
        account.code_hash = code_hash;
    }

    pub fn set_balance(&mut self, address: Address, balance: U256, reason: BalanceChangeReason) {
        if let Some(hook) = self.hook(|logger| logger.on_balance_change.as_ref()) {
            hook(address, self.get_balance(address), balance, reason);
        }
        self.accounts.entry(address).or_default().balance = balance;
    }

    pub fn add_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        let balance = self
            .get_balance(address)
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(address))?;
        self.set_balance(address, balance, reason);
        Ok(())
    }

    pub fn sub_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        let current = self.get_balance(address);
        let balance = current
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance {
                address,
                balance: current,
                required: amount,
            })?;
        self.set_balance(address, balance, reason);
        Ok(())
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        if let Some(hook) = self.hook(|logger| logger.on_nonce_change.as_ref()) {
            hook(address, self.get_nonce(address), nonce);
        }
        self.accounts.entry(address).or_default().nonce = nonce;
    }

    pub fn increment_nonce(&mut self, address: Address) -> Result<u64, StateError> {
        let nonce = self
            .get_nonce(address)
            .checked_add(1)
            .ok_or(StateError::NonceOverflow(address))?;
        self.set_nonce(address, nonce);
        Ok(nonce)
    }

    pub fn set_state(&mut self, address: Address, slot: H256, value: H256) {
        if let Some(hook) = self.hook(|logger| logger.on_storage_change.as_ref()) {
            hook(address, slot, self.get_state(address, slot), value);
        }
        let storage = &mut self.accounts.entry(address).or_default().storage;
        if value.is_zero() {
            storage.remove(&slot);
        } else {
            storage.insert(slot, value);
        }
    }

    pub fn add_log(&mut self, log: Log) {
        if let Some(logger) = &self.logger {
            logger.log(&log);
        }
        self.logs.push(log);
    }

    /// Drains the logs emitted since the last call.
    pub fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.logs)
    }

    /// Records the current state and returns an id to revert to.
    pub fn snapshot(&mut self) -> usize {
        self.snapshots.push((self.accounts.clone(), self.logs.len()));
        self.snapshots.len() - 1
    }

    /// Restores the state recorded by `id`, dropping it and every later snapshot.
    /// Reverts are not reported to the logger: consumers learn about discarded
    /// changes from the enclosing block or transaction end event.
    pub fn revert_to_snapshot(&mut self, id: usize) -> Result<(), StateError> {
        if id >= self.snapshots.len() {
            return Err(StateError::InvalidSnapshot(id));
        }
        let (accounts, logs_len) = self
            .snapshots
            .drain(id..)
            .next()
            .ok_or(StateError::InvalidSnapshot(id))?;
        self.accounts = accounts;
        self.logs.truncate(logs_len);
        trace!(snapshot = id, "Reverted state");
        Ok(())
    }

    /// Forgets the snapshot `id` and every later one, keeping the current state.
    pub fn discard_snapshot(&mut self, id: usize) -> Result<(), StateError> {
        if id >= self.snapshots.len() {
            return Err(StateError::InvalidSnapshot(id));
        }
        self.snapshots.truncate(id);
        Ok(())
    }
}
