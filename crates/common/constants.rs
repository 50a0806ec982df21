use ethereum_types::H256;
use hex_literal::hex;

/// Keccak-256 of empty code.
pub const EMPTY_CODE_HASH: H256 = H256(hex!(
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
));
