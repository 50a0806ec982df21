//! Live tracers compiled into the binary.
//!
//! - `noop`: every hook absent. Useful to measure the cost of the tracing
//!   plumbing alone.
//! - `log`: writes every event as a `tracing` event under the
//!   `livetrace::tracer` target. `log://?level=debug` (or `log?level=debug`)
//!   selects the level, `info` by default.

use std::error::Error;
use std::sync::Arc;

use livetrace::{BoxError, Hooks, LiveTracerRegistry, TracerIdentifier};
use livetrace_common::types::{BlockHeader, ChainConfig, Log, Receipt, Transaction};
use livetrace_common::{Address, H256, U256};
use livetrace_vm::{BalanceChangeReason, EvmHooks, GasChangeReason};
use livetrace_vm::tracing::{EnterEvent, ExitEvent, OpcodeEvent};
use tracing::{Level, debug, info};

pub fn register_builtin_tracers(registry: &mut LiveTracerRegistry) {
    registry.register("noop", new_noop_tracer);
    registry.register("log", new_log_tracer);
}

pub fn new_noop_tracer(_: &TracerIdentifier) -> Result<Hooks, BoxError> {
    Ok(Hooks::default())
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported log tracer level {0:?}, expected `info` or `debug`")]
pub struct UnsupportedLevel(String);

macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        if $level == Level::DEBUG {
            debug!(target: "livetrace::tracer", $($arg)+)
        } else {
            info!(target: "livetrace::tracer", $($arg)+)
        }
    };
}

pub fn new_log_tracer(identifier: &TracerIdentifier) -> Result<Hooks, BoxError> {
    let level = match identifier.query_param("level").as_deref() {
        None | Some("info") => Level::INFO,
        Some("debug") => Level::DEBUG,
        Some(other) => return Err(Box::new(UnsupportedLevel(other.to_owned()))),
    };

    let evm = EvmHooks {
        on_tx_start: Some(Arc::new(move |tx: &Transaction| {
            emit!(level, tx = %tx.hash(), from = %tx.from, nonce = tx.nonce, "tx start")
        })),
        on_tx_end: Some(Arc::new(
            move |receipt: Option<&Receipt>, err: Option<&(dyn Error + 'static)>| match (receipt, err) {
                (Some(receipt), _) => emit!(
                    level,
                    tx = %receipt.tx_hash,
                    gas_used = receipt.gas_used,
                    logs = receipt.logs.len(),
                    "tx end"
                ),
                (None, Some(err)) => emit!(level, %err, "tx failed"),
                (None, None) => emit!(level, "tx end"),
            },
        )),
        on_enter: Some(Arc::new(move |event: &EnterEvent<'_>| {
            emit!(
                level,
                depth = event.depth,
                call_type = ?event.call_type,
                from = %event.from,
                to = %event.to,
                value = %event.value,
                gas = event.gas,
                "enter"
            )
        })),
        on_exit: Some(Arc::new(move |event: &ExitEvent<'_>| {
            emit!(
                level,
                depth = event.depth,
                gas_used = event.gas_used,
                reverted = event.reverted,
                "exit"
            )
        })),
        on_fault: Some(Arc::new(move |event: &OpcodeEvent<'_>| {
            emit!(level, pc = event.pc, opcode = event.opcode, depth = event.depth, "fault")
        })),
        on_gas_change: Some(Arc::new(move |old: u64, new: u64, reason: GasChangeReason| {
            emit!(level, old, new, reason = ?reason, "gas change")
        })),
        on_balance_change: Some(Arc::new(move |address: Address, prev: U256, new: U256, reason: BalanceChangeReason| {
            emit!(level, %address, %prev, %new, reason = ?reason, "balance change")
        })),
        on_nonce_change: Some(Arc::new(move |address: Address, prev: u64, new: u64| {
            emit!(level, %address, prev, new, "nonce change")
        })),
        on_code_change: Some(Arc::new(
            move |address: Address, prev_hash: H256, _: &[u8], hash: H256, code: &[u8]| {
                emit!(
                    level,
                    %address,
                    %prev_hash,
                    %hash,
                    code = %hex::encode(code),
                    "code change"
                )
            },
        )),
        on_storage_change: Some(Arc::new(move |address: Address, slot: H256, prev: H256, new: H256| {
            emit!(level, %address, %slot, %prev, %new, "storage change")
        })),
        on_log: Some(Arc::new(move |log: &Log| {
            emit!(level, address = %log.address, topics = log.topics.len(), "log")
        })),
        on_close: Some(Arc::new(move || emit!(level, "tracer closed"))),
        ..Default::default()
    };

    Ok(Hooks {
        evm: Arc::new(evm),
        on_chain_init: Some(Arc::new(move |config: &ChainConfig| {
            emit!(level, chain_id = config.chain_id, "chain init")
        })),
        on_chain_block_start: Some(Arc::new(
            move |hash: H256, size: u64, header: &BlockHeader| {
                emit!(level, number = header.number, %hash, size, "block start")
            },
        )),
        on_chain_block_end: Some(Arc::new(move |err: Option<&(dyn Error + 'static)>| {
            match err {
                Some(err) => emit!(level, %err, "block discarded"),
                None => emit!(level, "block end"),
            }
        })),
    })
}
