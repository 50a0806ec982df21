use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    H256(Keccak256::digest(data.as_ref()).into())
}
