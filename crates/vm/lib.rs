//! Execution-engine side of live tracing: the fine-grained event model
//! ([`EvmHooks`]) and an in-memory [`StateDb`] that reports every state
//! mutation through it.

mod errors;
pub mod state;
pub mod tracing;

pub use errors::StateError;
pub use state::{Account, StateDb};
pub use crate::tracing::{BalanceChangeReason, CallType, EvmHooks, GasChangeReason};
