//! Primitive and chain types shared by the livetrace crates.

pub use ethereum_types::{Address, H256, U256};

pub mod constants;
pub mod types;
pub mod utils;
