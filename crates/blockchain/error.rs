use livetrace_common::H256;
use livetrace_vm::StateError;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Parent block {0:#x} not found")]
    ParentNotFound(H256),

    #[error("Transaction {tx_hash:#x} gas limit {gas_limit} is below the intrinsic gas {intrinsic}")]
    IntrinsicGasTooLow {
        tx_hash: H256,
        gas_limit: u64,
        intrinsic: u64,
    },

    #[error("Block gas used {used} exceeds the gas limit {limit}")]
    GasLimitExceeded { used: u64, limit: u64 },
}
