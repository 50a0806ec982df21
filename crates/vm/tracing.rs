//! Fine-grained execution events.
//!
//! [`EvmHooks`] is the engine's own event model: call frames, opcodes, gas and
//! every kind of state mutation, plus the engine-level block notifications.
//! Each callback is independently optional and `None` means the consumer is
//! not interested. Engine code fires events through the dispatch methods
//! (`hooks.code_change(..)`, `hooks.opcode(..)`, ...), which skip absent
//! callbacks, so call sites never need to inspect the fields themselves.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use livetrace_common::types::{BlockHeader, ChainConfig, Log, Receipt, Transaction};
use livetrace_common::{Address, H256, U256};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallType {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

/// Why a balance changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BalanceChangeReason {
    #[default]
    Unspecified,
    Transfer,
    GasBuy,
    GasRefund,
    /// Fee credited to the block's coinbase.
    Coinbase,
    Withdrawal,
    Genesis,
}

/// Why the gas available to the current frame changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GasChangeReason {
    #[default]
    Unspecified,
    TxInitialBalance,
    TxIntrinsicGas,
    TxLeftOverReturned,
}

/// State of the interpreter right before an opcode executes.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEvent<'a> {
    pub pc: u64,
    pub opcode: u8,
    pub gas: u64,
    pub cost: u64,
    pub depth: usize,
    pub return_data: &'a [u8],
    pub error: Option<&'a (dyn Error + 'static)>,
}

#[derive(Debug, Clone, Copy)]
pub struct EnterEvent<'a> {
    pub depth: usize,
    pub call_type: CallType,
    pub from: Address,
    pub to: Address,
    pub input: &'a [u8],
    pub gas: u64,
    pub value: U256,
}

#[derive(Debug, Clone, Copy)]
pub struct ExitEvent<'a> {
    pub depth: usize,
    pub output: &'a [u8],
    pub gas_used: u64,
    pub error: Option<&'a (dyn Error + 'static)>,
    pub reverted: bool,
}

pub type OnBlockchainInitHook = Arc<dyn Fn(&ChainConfig) + Send + Sync>;
pub type OnBlockStartHook = Arc<dyn Fn(&BlockHeader) + Send + Sync>;
pub type OnBlockEndHook = Arc<dyn Fn(Option<&(dyn Error + 'static)>) + Send + Sync>;
pub type OnCloseHook = Arc<dyn Fn() + Send + Sync>;
pub type OnTxStartHook = Arc<dyn Fn(&Transaction) + Send + Sync>;
pub type OnTxEndHook =
    Arc<dyn Fn(Option<&Receipt>, Option<&(dyn Error + 'static)>) + Send + Sync>;
pub type OnEnterHook = Arc<dyn Fn(&EnterEvent<'_>) + Send + Sync>;
pub type OnExitHook = Arc<dyn Fn(&ExitEvent<'_>) + Send + Sync>;
pub type OnOpcodeHook = Arc<dyn Fn(&OpcodeEvent<'_>) + Send + Sync>;
pub type OnFaultHook = Arc<dyn Fn(&OpcodeEvent<'_>) + Send + Sync>;
/// `(old, new, reason)`
pub type OnGasChangeHook = Arc<dyn Fn(u64, u64, GasChangeReason) + Send + Sync>;
/// `(address, prev, new, reason)`
pub type OnBalanceChangeHook =
    Arc<dyn Fn(Address, U256, U256, BalanceChangeReason) + Send + Sync>;
/// `(address, prev, new)`
pub type OnNonceChangeHook = Arc<dyn Fn(Address, u64, u64) + Send + Sync>;
/// `(address, prev_code_hash, prev_code, code_hash, code)`
pub type OnCodeChangeHook = Arc<dyn Fn(Address, H256, &[u8], H256, &[u8]) + Send + Sync>;
/// `(address, slot, prev, new)`
pub type OnStorageChangeHook = Arc<dyn Fn(Address, H256, H256, H256) + Send + Sync>;
pub type OnLogHook = Arc<dyn Fn(&Log) + Send + Sync>;

/// Callbacks fired by the execution engine while it runs transactions.
#[derive(Clone, Default)]
pub struct EvmHooks {
    // Engine-level chain events
    pub on_blockchain_init: Option<OnBlockchainInitHook>,
    pub on_block_start: Option<OnBlockStartHook>,
    pub on_block_end: Option<OnBlockEndHook>,
    pub on_close: Option<OnCloseHook>,

    // Transaction and call frame events
    pub on_tx_start: Option<OnTxStartHook>,
    pub on_tx_end: Option<OnTxEndHook>,
    pub on_enter: Option<OnEnterHook>,
    pub on_exit: Option<OnExitHook>,
    pub on_opcode: Option<OnOpcodeHook>,
    pub on_fault: Option<OnFaultHook>,
    pub on_gas_change: Option<OnGasChangeHook>,

    // State events
    pub on_balance_change: Option<OnBalanceChangeHook>,
    pub on_nonce_change: Option<OnNonceChangeHook>,
    pub on_code_change: Option<OnCodeChangeHook>,
    pub on_storage_change: Option<OnStorageChangeHook>,
    pub on_log: Option<OnLogHook>,
}

impl EvmHooks {
    pub fn blockchain_init(&self, chain_config: &ChainConfig) {
        if let Some(hook) = &self.on_blockchain_init {
            hook(chain_config);
        }
    }

    pub fn block_start(&self, header: &BlockHeader) {
        if let Some(hook) = &self.on_block_start {
            hook(header);
        }
    }

    pub fn block_end(&self, err: Option<&(dyn Error + 'static)>) {
        if let Some(hook) = &self.on_block_end {
            hook(err);
        }
    }

    pub fn close(&self) {
        if let Some(hook) = &self.on_close {
            hook();
        }
    }

    pub fn tx_start(&self, tx: &Transaction) {
        if let Some(hook) = &self.on_tx_start {
            hook(tx);
        }
    }

    pub fn tx_end(&self, receipt: Option<&Receipt>, err: Option<&(dyn Error + 'static)>) {
        if let Some(hook) = &self.on_tx_end {
            hook(receipt, err);
        }
    }

    pub fn enter(&self, event: &EnterEvent<'_>) {
        if let Some(hook) = &self.on_enter {
            hook(event);
        }
    }

    pub fn exit(&self, event: &ExitEvent<'_>) {
        if let Some(hook) = &self.on_exit {
            hook(event);
        }
    }

    pub fn opcode(&self, event: &OpcodeEvent<'_>) {
        if let Some(hook) = &self.on_opcode {
            hook(event);
        }
    }

    pub fn fault(&self, event: &OpcodeEvent<'_>) {
        if let Some(hook) = &self.on_fault {
            hook(event);
        }
    }

    pub fn gas_change(&self, old: u64, new: u64, reason: GasChangeReason) {
        if let Some(hook) = &self.on_gas_change {
            hook(old, new, reason);
        }
    }

    pub fn balance_change(
        &self,
        address: Address,
        prev: U256,
        new: U256,
        reason: BalanceChangeReason,
    ) {
        if let Some(hook) = &self.on_balance_change {
            hook(address, prev, new, reason);
        }
    }

    pub fn nonce_change(&self, address: Address, prev: u64, new: u64) {
        if let Some(hook) = &self.on_nonce_change {
            hook(address, prev, new);
        }
    }

    pub fn code_change(
        &self,
        address: Address,
        prev_code_hash: H256,
        prev_code: &[u8],
        code_hash: H256,
        code: &[u8],
    ) {
        if let Some(hook) = &self.on_code_change {
            hook(address, prev_code_hash, prev_code, code_hash, code);
        }
    }

    pub fn storage_change(&self, address: Address, slot: H256, prev: H256, new: H256) {
        if let Some(hook) = &self.on_storage_change {
            hook(address, slot, prev, new);
        }
    }

    pub fn log(&self, log: &Log) {
        if let Some(hook) = &self.on_log {
            hook(log);
        }
    }
}

impl fmt::Debug for EvmHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmHooks")
            .field("on_blockchain_init", &self.on_blockchain_init.is_some())
            .field("on_block_start", &self.on_block_start.is_some())
            .field("on_block_end", &self.on_block_end.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_tx_start", &self.on_tx_start.is_some())
            .field("on_tx_end", &self.on_tx_end.is_some())
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_opcode", &self.on_opcode.is_some())
            .field("on_fault", &self.on_fault.is_some())
            .field("on_gas_change", &self.on_gas_change.is_some())
            .field("on_balance_change", &self.on_balance_change.is_some())
            .field("on_nonce_change", &self.on_nonce_change.is_some())
            .field("on_code_change", &self.on_code_change.is_some())
            .field("on_storage_change", &self.on_storage_change.is_some())
            .field("on_log", &self.on_log.is_some())
            .finish()
    }
}
