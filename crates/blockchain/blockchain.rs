//! # livetrace Blockchain
//!
//! A minimal in-memory execution engine that drives a live tracer.
//!
//! It executes plain value transfers, contract creations and storage writes
//! against a [`StateDb`] and reports every step to the tracer bound to the
//! [`ExecutionContext`] it is given.
//!
//! ## Block Execution Flow
//!
//! ```text
//! 1. on_chain_block_start(hash, size, header)
//! 2. Known block: on_chain_block_end(None), nothing else
//! 3. Check the parent is known, snapshot the state, attach the tracer's EvmHooks
//! 4. Per transaction: tx_start, enter, state changes, exit, tx_end
//! 5. On failure: revert to the snapshot, on_chain_block_end(Some(err))
//! 6. Otherwise: on_chain_block_end(None) and remember the block
//! ```

pub mod error;

use std::error::Error;

use error::ChainError;
use livetrace::{ExecutionContext, Hooks, get_ctx_live_tracer};
use livetrace_common::Address;
use livetrace_common::types::{
    Block, BlockHash, BlockHeader, ChainConfig, Receipt, TX_BASE_GAS, Transaction, TxKind,
};
use livetrace_vm::tracing::{EnterEvent, ExitEvent};
use livetrace_vm::{BalanceChangeReason, CallType, GasChangeReason, StateDb, StateError};
use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
pub struct Blockchain {
    chain_config: ChainConfig,
    state: StateDb,
    known_blocks: FxHashSet<BlockHash>,
}

fn emit(tracer: Option<&Hooks>, f: impl FnOnce(&Hooks)) {
    if let Some(tracer) = tracer {
        f(tracer);
    }
}

impl Blockchain {
    /// Creates a chain whose only known block is `genesis`, on top of `state`.
    pub fn new(chain_config: ChainConfig, genesis: &BlockHeader, state: StateDb) -> Self {
        let mut known_blocks = FxHashSet::default();
        known_blocks.insert(genesis.hash());
        Self {
            chain_config,
            state,
            known_blocks,
        }
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain_config
    }

    pub fn state(&self) -> &StateDb {
        &self.state
    }

    pub fn is_known(&self, hash: BlockHash) -> bool {
        self.known_blocks.contains(&hash)
    }

    /// Executes `block`, reporting to the live tracer bound to `ctx`, if any.
    ///
    /// Every call fires exactly one `on_chain_block_start` and one matching
    /// `on_chain_block_end`. Blocks already processed are skipped and produce
    /// the pair alone. On error the state is left as it was before the block.
    #[instrument(
        level = "debug",
        name = "Process Block",
        skip_all,
        fields(number = block.header.number)
    )]
    pub fn process_block(
        &mut self,
        ctx: &ExecutionContext,
        block: &Block,
    ) -> Result<Vec<Receipt>, ChainError> {
        let tracer = get_ctx_live_tracer(ctx);
        let tracer = tracer.as_deref();
        let block_hash = block.hash();

        emit(tracer, |t| {
            t.chain_block_start(block_hash, block.size(), &block.header)
        });

        if self.is_known(block_hash) {
            debug!(hash = %block_hash, "Skipping already known block");
            emit(tracer, |t| t.chain_block_end(None));
            return Ok(Vec::new());
        }

        match self.execute_block(tracer, block) {
            Ok(receipts) => {
                emit(tracer, |t| t.chain_block_end(None));
                self.known_blocks.insert(block_hash);
                info!(
                    hash = %block_hash,
                    txs = receipts.len(),
                    gas_used = receipts.last().map(|r| r.cumulative_gas_used).unwrap_or_default(),
                    "Executed block"
                );
                Ok(receipts)
            }
            Err(err) => {
                emit(tracer, |t| t.chain_block_end(Some(&err)));
                warn!(hash = %block_hash, %err, "Block execution failed");
                Err(err)
            }
        }
    }

    fn execute_block(
        &mut self,
        tracer: Option<&Hooks>,
        block: &Block,
    ) -> Result<Vec<Receipt>, ChainError> {
        let parent_hash = block.header.parent_hash;
        if !self.is_known(parent_hash) {
            return Err(ChainError::ParentNotFound(parent_hash));
        }

        let snapshot = self.state.snapshot();
        self.state.set_logger(tracer.map(Hooks::evm_hooks));
        emit(tracer, |t| t.block_start(&block.header));

        let result = self.execute_transactions(tracer, block);

        emit(tracer, |t| {
            t.block_end(result.as_ref().err().map(|err| err as &(dyn Error + 'static)))
        });
        self.state.set_logger(None);

        match result {
            Ok(receipts) => {
                self.state.discard_snapshot(snapshot)?;
                Ok(receipts)
            }
            Err(err) => {
                self.state.revert_to_snapshot(snapshot)?;
                Err(err)
            }
        }
    }

    fn execute_transactions(
        &mut self,
        tracer: Option<&Hooks>,
        block: &Block,
    ) -> Result<Vec<Receipt>, ChainError> {
        let mut receipts = Vec::with_capacity(block.body.transactions.len());
        let mut cumulative_gas_used = 0u64;

        for tx in &block.body.transactions {
            let receipt = self.execute_transaction(tracer, tx, cumulative_gas_used)?;
            cumulative_gas_used = receipt.cumulative_gas_used;
            if cumulative_gas_used > block.header.gas_limit {
                return Err(ChainError::GasLimitExceeded {
                    used: cumulative_gas_used,
                    limit: block.header.gas_limit,
                });
            }
            receipts.push(receipt);
        }
        Ok(receipts)
    }

    fn execute_transaction(
        &mut self,
        tracer: Option<&Hooks>,
        tx: &Transaction,
        cumulative_gas_used: u64,
    ) -> Result<Receipt, ChainError> {
        let tx_hash = tx.hash();
        emit(tracer, |t| t.tx_start(tx));

        match self.apply_transaction(tracer, tx) {
            Ok(gas_used) => {
                let receipt = Receipt {
                    tx_hash,
                    succeeded: true,
                    gas_used,
                    cumulative_gas_used: cumulative_gas_used.saturating_add(gas_used),
                    logs: self.state.take_logs(),
                };
                emit(tracer, |t| t.tx_end(Some(&receipt), None));
                Ok(receipt)
            }
            Err(err) => {
                emit(tracer, |t| t.tx_end(None, Some(&err)));
                debug!(tx = %tx_hash, %err, "Transaction failed");
                Err(err)
            }
        }
    }

    /// Runs `tx` as a single top-level frame and returns the gas it used.
    fn apply_transaction(
        &mut self,
        tracer: Option<&Hooks>,
        tx: &Transaction,
    ) -> Result<u64, ChainError> {
        let Some(gas_left) = tx.gas_limit.checked_sub(TX_BASE_GAS) else {
            return Err(ChainError::IntrinsicGasTooLow {
                tx_hash: tx.hash(),
                gas_limit: tx.gas_limit,
                intrinsic: TX_BASE_GAS,
            });
        };
        emit(tracer, |t| {
            t.gas_change(0, tx.gas_limit, GasChangeReason::TxInitialBalance);
            t.gas_change(tx.gas_limit, gas_left, GasChangeReason::TxIntrinsicGas);
        });

        let expected = self.state.get_nonce(tx.from);
        if tx.nonce != expected {
            return Err(StateError::NonceMismatch {
                address: tx.from,
                expected,
                got: tx.nonce,
            }
            .into());
        }

        let (call_type, to) = match tx.to {
            TxKind::Call(to) => (CallType::Call, to),
            TxKind::Create => (CallType::Create, tx.create_address()),
        };
        emit(tracer, |t| {
            t.enter(&EnterEvent {
                depth: 0,
                call_type,
                from: tx.from,
                to,
                input: &tx.data,
                gas: gas_left,
                value: tx.value,
            })
        });

        let outcome = self.apply_message(tx, call_type, to);

        emit(tracer, |t| {
            t.exit(&ExitEvent {
                depth: 0,
                output: &[],
                gas_used: TX_BASE_GAS,
                error: outcome
                    .as_ref()
                    .err()
                    .map(|err| err as &(dyn Error + 'static)),
                reverted: outcome.is_err(),
            })
        });
        outcome?;

        emit(tracer, |t| {
            t.gas_change(gas_left, 0, GasChangeReason::TxLeftOverReturned)
        });
        Ok(TX_BASE_GAS)
    }

    fn apply_message(
        &mut self,
        tx: &Transaction,
        call_type: CallType,
        to: Address,
    ) -> Result<(), StateError> {
        self.state.increment_nonce(tx.from)?;

        if call_type == CallType::Create {
            if self.state.get_nonce(to) != 0 || self.state.get_code_size(to) != 0 {
                return Err(StateError::AddressCollision(to));
            }
            self.state.set_nonce(to, 1);
            self.state.set_code(to, tx.data.clone());
        }

        if !tx.value.is_zero() {
            self.state
                .sub_balance(tx.from, tx.value, BalanceChangeReason::Transfer)?;
            self.state
                .add_balance(to, tx.value, BalanceChangeReason::Transfer)?;
        }

        for write in &tx.storage_writes {
            self.state.set_state(to, write.slot, write.value);
        }
        Ok(())
    }
}
