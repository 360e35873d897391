//! Block header and receipt structures

use crate::{Address, BlockNumber, CoreError, CoreResult, Gas, Hash, Timestamp};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Block header containing metadata and the running gas accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode)]
pub struct BlockHeader {
    /// Hash of the parent block
    pub parent_hash: Hash,
    /// Block number (height)
    pub number: BlockNumber,
    /// Root hash of the state trie
    pub state_root: Hash,
    /// Root hash of the transaction trie
    pub transactions_root: Hash,
    /// Root hash of the receipts trie
    pub receipts_root: Hash,
    /// Block timestamp in milliseconds
    pub timestamp: Timestamp,
    /// Extra data (arbitrary bytes)
    pub extra_data: Vec<u8>,
    /// Gas limit for all transactions in this block
    pub gas_limit: Gas,
    /// Gas used by all transactions applied so far
    pub gas_used: Gas,
}

impl BlockHeader {
    /// Calculate the hash of this block header
    pub fn hash(&self) -> CoreResult<Hash> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CoreError::Bincode(e.to_string()))?;
        let hash_bytes = Keccak256::digest(&encoded);
        Ok(Hash::from_slice(hash_bytes.as_slice()))
    }

    /// Get the genesis block header
    pub fn genesis() -> Self {
        Self {
            parent_hash: Hash::zero(),
            number: 0,
            state_root: Hash::zero(),
            transactions_root: Hash::zero(),
            receipts_root: Hash::zero(),
            timestamp: 0,
            extra_data: b"ShardVM Genesis Block".to_vec(),
            gas_limit: 8_000_000,
            gas_used: 0,
        }
    }
}

/// Transaction receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction hash
    pub transaction_hash: Hash,
    /// Initiating account
    pub initiator: Address,
    /// Recipient address (None for contract creation)
    pub destination: Option<Address>,
    /// Gas used by this transaction
    pub gas_used: Gas,
    /// Block gas total after this transaction
    pub cumulative_gas_used: Gas,
    /// Status (1 for success, 0 for failure)
    pub status: u8,
    /// Contract address (if contract creation succeeded)
    pub contract_address: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_header() {
        let genesis = BlockHeader::genesis();
        assert_eq!(genesis.number, 0);
        assert_eq!(genesis.parent_hash, Hash::zero());
        assert_eq!(genesis.gas_used, 0);
    }

    #[test]
    fn test_header_hash_deterministic() {
        let genesis = BlockHeader::genesis();
        let hash1 = genesis.hash().unwrap();
        let hash2 = genesis.hash().unwrap();
        assert_eq!(hash1, hash2);

        let mut other = genesis.clone();
        other.gas_used = 21_000;
        assert_ne!(other.hash().unwrap(), hash1);
    }
}
