use ethereum_types::{Address, U256};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Insufficient balance for {address:#x}: have {balance}, need {required}")]
    InsufficientBalance {
        address: Address,
        balance: U256,
        required: U256,
    },
    #[error("Nonce mismatch for {address:#x}: expected {expected}, got {got}")]
    NonceMismatch {
        address: Address,
        expected: u64,
        got: u64,
    },
    #[error("Nonce overflow for {0:#x}")]
    NonceOverflow(Address),
    #[error("Balance overflow for {0:#x}")]
    BalanceOverflow(Address),
    #[error("Unknown snapshot id {0}")]
    InvalidSnapshot(usize),
    #[error("Contract already deployed at {0:#x}")]
    AddressCollision(Address),
}
