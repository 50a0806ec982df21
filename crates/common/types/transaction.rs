use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::utils::keccak;

/// Intrinsic gas charged to every transaction by the in-memory engine.
pub const TX_BASE_GAS: u64 = 21_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

/// A storage slot written by a call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageWrite {
    pub slot: H256,
    pub value: H256,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    pub from: Address,
    pub to: TxKind,
    pub value: U256,
    pub gas_limit: u64,
    /// Init code for `TxKind::Create`, calldata otherwise.
    pub data: Bytes,
    /// Slots written in the callee's storage. The in-memory engine has no
    /// interpreter, so contract effects are spelled out on the transaction.
    #[serde(default)]
    pub storage_writes: Vec<StorageWrite>,
}

impl Transaction {
    pub fn encode_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(self.from.as_bytes());
        match self.to {
            TxKind::Call(to) => buf.extend_from_slice(to.as_bytes()),
            TxKind::Create => buf.push(0x80),
        }
        buf.extend_from_slice(&self.value.to_big_endian());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.data);
        for write in &self.storage_writes {
            buf.extend_from_slice(write.slot.as_bytes());
            buf.extend_from_slice(write.value.as_bytes());
        }
    }

    pub fn hash(&self) -> H256 {
        let mut buf = Vec::new();
        self.encode_to(&mut buf);
        keccak(buf)
    }

    /// Address of the contract a `TxKind::Create` transaction deploys.
    pub fn create_address(&self) -> Address {
        let mut buf = Vec::with_capacity(28);
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        Address::from_slice(&keccak(buf).as_bytes()[12..])
    }
}
