//! Sharding transaction data structures

use crate::{Address, CoreError, CoreResult, Gas, Hash, Wei};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// An access-list entry: an address the transaction intends to touch,
/// with the storage keys it declares under that address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode)]
pub struct AccessListEntry {
    /// Touched account
    pub address: Address,
    /// Declared storage keys under that account
    pub storage_keys: Vec<Hash>,
}

impl AccessListEntry {
    /// Entry for an address with no declared storage keys
    pub fn address_only(address: Address) -> Self {
        Self {
            address,
            storage_keys: Vec::new(),
        }
    }

    /// Entry for an address with declared storage keys
    pub fn with_keys(address: Address, storage_keys: Vec<Hash>) -> Self {
        Self {
            address,
            storage_keys,
        }
    }
}

/// Sharding transaction.
///
/// The initiator is carried explicitly; the witness bytes are opaque to this
/// core (validation of them belongs to the decoding layer). A transaction
/// with no destination is a contract creation, and declares the address it
/// expects to be created at as the access list's second entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode)]
pub struct Transaction {
    /// Initiating account
    pub initiator: Address,
    /// Recipient address (None for contract creation)
    pub destination: Option<Address>,
    /// Value to transfer in wei
    pub value: Wei,
    /// Transaction payload data
    pub data: Vec<u8>,
    /// Opaque signature/witness bytes
    pub witness: Vec<u8>,
    /// Pre-declared touched addresses and storage keys
    pub access_list: Vec<AccessListEntry>,
    /// Initialization code (used only during creation)
    pub code: Vec<u8>,
    /// Creation-scheme salt (None encodes as 32 zero bytes)
    pub salt: Option<Hash>,
    /// Maximum gas this transaction may consume
    pub gas_limit: Gas,
}

impl Transaction {
    /// Create a message-call transaction
    pub fn call(
        initiator: Address,
        destination: Address,
        value: Wei,
        data: Vec<u8>,
        gas_limit: Gas,
    ) -> Self {
        Self {
            initiator,
            destination: Some(destination),
            value,
            data,
            witness: Vec::new(),
            access_list: vec![AccessListEntry::address_only(initiator)],
            code: Vec::new(),
            salt: None,
            gas_limit,
        }
    }

    /// Create a contract-creation transaction.
    ///
    /// `declared_target` is the address the initiator expects the contract
    /// to land at; it rides in the access list's second slot and is checked
    /// against the derived address during application.
    pub fn create(
        initiator: Address,
        declared_target: Address,
        value: Wei,
        code: Vec<u8>,
        salt: Option<Hash>,
        gas_limit: Gas,
    ) -> Self {
        Self {
            initiator,
            destination: None,
            value,
            data: Vec::new(),
            witness: Vec::new(),
            access_list: vec![
                AccessListEntry::address_only(initiator),
                AccessListEntry::address_only(declared_target),
            ],
            code,
            salt,
            gas_limit,
        }
    }

    /// Whether this transaction creates a contract
    pub fn is_creation(&self) -> bool {
        self.destination.is_none()
    }

    /// The creation target declared in the access list's second slot
    pub fn declared_creation_target(&self) -> Option<Address> {
        self.access_list.get(1).map(|entry| entry.address)
    }

    /// Calculate transaction hash
    pub fn hash(&self) -> CoreResult<Hash> {
        let encoded = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CoreError::Bincode(e.to_string()))?;
        let hash_bytes = Keccak256::digest(&encoded);
        Ok(Hash::from_slice(hash_bytes.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_transaction() {
        let initiator = Address::from_hex("1234567890abcdef1234567890abcdef12345678").unwrap();
        let destination = Address::new([2u8; 20]);
        let tx = Transaction::call(initiator, destination, 1000, vec![], 100_000);

        assert!(!tx.is_creation());
        assert_eq!(tx.destination, Some(destination));
        assert_eq!(tx.value, 1000);
        assert_eq!(tx.declared_creation_target(), None);
    }

    #[test]
    fn test_creation_transaction() {
        let initiator = Address::new([1u8; 20]);
        let target = Address::new([9u8; 20]);
        let code = vec![0x60, 0x60, 0x60, 0x40];
        let tx = Transaction::create(initiator, target, 0, code.clone(), None, 200_000);

        assert!(tx.is_creation());
        assert_eq!(tx.destination, None);
        assert_eq!(tx.code, code);
        assert_eq!(tx.declared_creation_target(), Some(target));
        assert_eq!(tx.access_list[0].address, initiator);
    }

    #[test]
    fn test_transaction_hash_deterministic() {
        let initiator = Address::new([1u8; 20]);
        let tx = Transaction::call(initiator, Address::new([2u8; 20]), 5, vec![1, 2, 3], 50_000);

        let hash = tx.hash().unwrap();
        let hash2 = tx.hash().unwrap();
        assert_eq!(hash, hash2);

        let mut other = tx.clone();
        other.value = 6;
        assert_ne!(other.hash().unwrap(), hash);
    }
}
