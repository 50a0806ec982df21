use bytes::Bytes;
use ethereum_types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::types::Transaction;
use crate::utils::keccak;

pub type BlockHash = H256;
pub type BlockNumber = u64;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub parent_hash: H256,
    pub coinbase: Address,
    pub state_root: H256,
    pub number: BlockNumber,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: Option<u64>,
}

impl BlockHeader {
    /// Appends the header fields in declaration order, integers big endian.
    pub fn encode_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.parent_hash.as_bytes());
        buf.extend_from_slice(self.coinbase.as_bytes());
        buf.extend_from_slice(self.state_root.as_bytes());
        buf.extend_from_slice(&self.number.to_be_bytes());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.gas_used.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.extra_data);
        if let Some(base_fee) = self.base_fee_per_gas {
            buf.extend_from_slice(&base_fee.to_be_bytes());
        }
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf);
        buf
    }

    pub fn hash(&self) -> BlockHash {
        keccak(self.encode_to_vec())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        Self { header, body }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// Size in bytes of the encoded header plus every encoded transaction.
    pub fn size(&self) -> u64 {
        let mut buf = self.header.encode_to_vec();
        for tx in &self.body.transactions {
            tx.encode_to(&mut buf);
        }
        u64::try_from(buf.len()).unwrap_or(u64::MAX)
    }
}
