use ethereum_types::Address;
use serde::{Deserialize, Serialize};

/// Blockchain settings defined per network, in the layout used by genesis files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub chain_id: u64,

    pub homestead_block: Option<u64>,
    pub byzantium_block: Option<u64>,
    pub berlin_block: Option<u64>,
    pub london_block: Option<u64>,
    pub merge_netsplit_block: Option<u64>,

    pub shanghai_time: Option<u64>,
    pub cancun_time: Option<u64>,
    pub prague_time: Option<u64>,
    pub osaka_time: Option<u64>,

    pub terminal_total_difficulty: Option<u128>,
    #[serde(default)]
    pub terminal_total_difficulty_passed: bool,
    #[serde(default)]
    pub deposit_contract_address: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            homestead_block: None,
            byzantium_block: None,
            berlin_block: None,
            london_block: None,
            merge_netsplit_block: None,
            shanghai_time: None,
            cancun_time: None,
            prague_time: None,
            osaka_time: None,
            terminal_total_difficulty: None,
            terminal_total_difficulty_passed: false,
            deposit_contract_address: Address::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_genesis_config() {
        let json = r#"{
            "chainId": 1329,
            "londonBlock": 0,
            "shanghaiTime": 100,
            "cancunTime": 200
        }"#;
        let config: ChainConfig = serde_json::from_str(json).expect("valid chain config");
        assert_eq!(config.chain_id, 1329);
        assert_eq!(config.london_block, Some(0));
        assert_eq!(config.shanghai_time, Some(100));
        assert_eq!(config.cancun_time, Some(200));
        assert!(!config.terminal_total_difficulty_passed);
        assert_eq!(config.deposit_contract_address, Address::zero());
    }
}
