//! The hook bundle a live tracer hands to the chain.
//!
//! [`Hooks`] embeds the execution engine's fine-grained [`EvmHooks`] and adds
//! the chain lifecycle events. The lifecycle hooks are prefixed with `chain`
//! so they never clash with the engine's own `on_blockchain_init`,
//! `on_block_start` and `on_block_end`; a tracer may implement both sets.
//! Through [`Deref`], a `Hooks` can be used wherever engine code expects
//! `&EvmHooks`.
//!
//! Dispatch contract for the engine:
//!
//! - `on_chain_init` fires once, before any block is processed.
//! - `on_chain_block_start` fires once per block attempt, before its first
//!   transaction, including blocks skipped because they are already known.
//! - `on_chain_block_end` fires once per start, after the last transaction or
//!   after execution aborted. An error means every change reported since the
//!   matching start must be discarded.
//! - Fine-grained events only fire between a start and its end.
//! - Any hook left `None` is a no-op.

use std::error::Error;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use livetrace_common::H256;
use livetrace_common::types::{BlockHeader, ChainConfig};
use livetrace_vm::EvmHooks;

pub type OnChainInitHook = Arc<dyn Fn(&ChainConfig) + Send + Sync>;
/// `(block_hash, block_size_bytes, header)`
pub type OnChainBlockStartHook = Arc<dyn Fn(H256, u64, &BlockHeader) + Send + Sync>;
pub type OnChainBlockEndHook = Arc<dyn Fn(Option<&(dyn Error + 'static)>) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    pub evm: Arc<EvmHooks>,

    pub on_chain_init: Option<OnChainInitHook>,
    pub on_chain_block_start: Option<OnChainBlockStartHook>,
    pub on_chain_block_end: Option<OnChainBlockEndHook>,
}

impl Hooks {
    pub fn new(evm: EvmHooks) -> Self {
        Self {
            evm: Arc::new(evm),
            ..Default::default()
        }
    }

    /// Shared handle to the fine-grained hooks, for attaching to a state db.
    pub fn evm_hooks(&self) -> Arc<EvmHooks> {
        self.evm.clone()
    }

    pub fn chain_init(&self, chain_config: &ChainConfig) {
        if let Some(hook) = &self.on_chain_init {
            hook(chain_config);
        }
    }

    pub fn chain_block_start(&self, block_hash: H256, block_size: u64, header: &BlockHeader) {
        if let Some(hook) = &self.on_chain_block_start {
            hook(block_hash, block_size, header);
        }
    }

    pub fn chain_block_end(&self, err: Option<&(dyn Error + 'static)>) {
        if let Some(hook) = &self.on_chain_block_end {
            hook(err);
        }
    }
}

impl Deref for Hooks {
    type Target = EvmHooks;

    fn deref(&self) -> &Self::Target {
        &self.evm
    }
}

impl From<EvmHooks> for Hooks {
    fn from(evm: EvmHooks) -> Self {
        Self::new(evm)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("evm", &self.evm)
            .field("on_chain_init", &self.on_chain_init.is_some())
            .field("on_chain_block_start", &self.on_chain_block_start.is_some())
            .field("on_chain_block_end", &self.on_chain_block_end.is_some())
            .finish()
    }
}
