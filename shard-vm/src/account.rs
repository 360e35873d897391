//! Account model and buffered change sets

use crate::{ComputationError, VmError, VmResult};
use serde::{Deserialize, Serialize};
use shard_core::{Address, Hash, Nonce, StorageKey, StorageValue, Wei};
use std::collections::HashMap;

/// Account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account nonce
    pub nonce: Nonce,
    /// Account balance
    pub balance: Wei,
    /// Hash of the account's code (zero for non-contracts)
    pub code_hash: Hash,
}

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self {
            nonce: 0,
            balance: 0,
            code_hash: Hash::zero(),
        }
    }

    /// Create an account with initial balance
    pub fn with_balance(balance: Wei) -> Self {
        Self {
            nonce: 0,
            balance,
            code_hash: Hash::zero(),
        }
    }

    /// Check if account is empty
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance == 0 && self.code_hash.is_zero()
    }

    /// Occupied accounts are ineligible as creation targets.
    ///
    /// An address that merely received a value transfer (nonzero balance,
    /// zero nonce, no code) is not occupied.
    pub fn is_occupied(&self) -> bool {
        self.nonce != 0 || !self.code_hash.is_zero()
    }

    /// Check if account is a contract
    pub fn is_contract(&self) -> bool {
        !self.code_hash.is_zero()
    }

    /// Add to balance
    pub fn add_balance(&mut self, amount: Wei) -> VmResult<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| VmError::State("balance overflow".to_string()))?;
        Ok(())
    }

    /// Subtract from balance
    pub fn sub_balance(&mut self, amount: Wei) -> VmResult<()> {
        if self.balance < amount {
            return Err(ComputationError::InsufficientBalance {
                required: amount,
                available: self.balance,
            }
            .into());
        }
        self.balance -= amount;
        Ok(())
    }

    /// Set code hash (for contract accounts)
    pub fn set_code_hash(&mut self, code_hash: Hash) {
        self.code_hash = code_hash;
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffered account, storage, and code writes for one transaction.
///
/// A mutable session accumulates its writes here; on commit they are applied
/// to the backing store in one batch, on discard they are dropped wholesale.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    /// Updated account records
    pub accounts: HashMap<Address, Account>,
    /// Buffered storage writes
    pub storage: HashMap<Address, HashMap<StorageKey, StorageValue>>,
    /// Buffered code writes
    pub code: HashMap<Address, Vec<u8>>,
}

impl AccountChanges {
    /// Create new empty changes
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if changes are empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.storage.is_empty() && self.code.is_empty()
    }

    /// Buffer an account update
    pub fn update_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    /// Buffered account record, if any
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Buffer a storage write
    pub fn update_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.storage.entry(address).or_default().insert(key, value);
    }

    /// Buffered storage value, if any
    pub fn storage_value(&self, address: &Address, key: &StorageKey) -> Option<StorageValue> {
        self.storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied()
    }

    /// Buffer a code write
    pub fn update_code(&mut self, address: Address, code: Vec<u8>) {
        self.code.insert(address, code);
    }

    /// Buffered code, if any
    pub fn code(&self, address: &Address) -> Option<&Vec<u8>> {
        self.code.get(address)
    }
}
