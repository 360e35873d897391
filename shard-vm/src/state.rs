//! Backing state database

use crate::account::{Account, AccountChanges};
use crate::VmResult;
use shard_core::{Address, Hash, StorageKey, StorageValue};
use std::collections::HashMap;

/// Backing state database trait.
///
/// This is the dumb key-value layer beneath the session abstraction: it
/// stores what it is told and enforces no transaction semantics. Rollback,
/// occupancy checks, and code-hash maintenance belong to the session layer.
pub trait StateDB: Send + Sync {
    /// Get account by address
    fn get_account(&self, address: &Address) -> VmResult<Option<Account>>;

    /// Set account
    fn set_account(&mut self, address: Address, account: Account) -> VmResult<()>;

    /// Get storage value
    fn get_storage(&self, address: &Address, key: &StorageKey) -> VmResult<Option<StorageValue>>;

    /// Set storage value (writing zero clears the slot)
    fn set_storage(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> VmResult<()>;

    /// Get contract code
    fn get_code(&self, address: &Address) -> VmResult<Option<Vec<u8>>>;

    /// Set contract code
    fn set_code(&mut self, address: Address, code: Vec<u8>) -> VmResult<()>;

    /// Apply batch changes
    fn apply_changes(&mut self, changes: AccountChanges) -> VmResult<()>;

    /// Get state root hash
    fn state_root(&self) -> Hash;
}

/// In-memory state database implementation
#[derive(Debug, Clone)]
pub struct MemoryStateDB {
    /// Account data
    accounts: HashMap<Address, Account>,
    /// Storage data
    storage: HashMap<Address, HashMap<StorageKey, StorageValue>>,
    /// Contract code
    code: HashMap<Address, Vec<u8>>,
    /// State root cache
    state_root: Hash,
}

impl MemoryStateDB {
    /// Create new memory state DB
    pub fn new() -> Self {
        let mut db = Self {
            accounts: HashMap::new(),
            storage: HashMap::new(),
            code: HashMap::new(),
            state_root: Hash::zero(),
        };
        db.update_state_root();
        db
    }

    /// Recompute the state root over the sorted store contents
    fn update_state_root(&mut self) {
        let mut hasher = blake3::Hasher::new();

        let mut sorted_accounts: Vec<_> = self.accounts.iter().collect();
        sorted_accounts.sort_by_key(|(addr, _)| *addr);
        for (address, account) in sorted_accounts {
            hasher.update(address.as_bytes());
            hasher.update(&account.nonce.to_le_bytes());
            hasher.update(&account.balance.to_le_bytes());
            hasher.update(account.code_hash.as_bytes());
        }

        let mut sorted_storage: Vec<_> = self.storage.iter().collect();
        sorted_storage.sort_by_key(|(addr, _)| *addr);
        for (address, slots) in sorted_storage {
            hasher.update(address.as_bytes());
            let mut sorted_slots: Vec<_> = slots.iter().collect();
            sorted_slots.sort_by_key(|(key, _)| *key);
            for (key, value) in sorted_slots {
                hasher.update(key.as_bytes());
                hasher.update(value.as_bytes());
            }
        }

        let mut sorted_code: Vec<_> = self.code.iter().collect();
        sorted_code.sort_by_key(|(addr, _)| *addr);
        for (address, code) in sorted_code {
            hasher.update(address.as_bytes());
            hasher.update(code);
        }

        let hash = hasher.finalize();
        self.state_root = Hash::from_slice(&hash.as_bytes()[..32]);
    }
}

impl Default for MemoryStateDB {
    fn default() -> Self {
        Self::new()
    }
}

impl StateDB for MemoryStateDB {
    fn get_account(&self, address: &Address) -> VmResult<Option<Account>> {
        Ok(self.accounts.get(address).cloned())
    }

    fn set_account(&mut self, address: Address, account: Account) -> VmResult<()> {
        if account.is_empty() {
            self.accounts.remove(&address);
        } else {
            self.accounts.insert(address, account);
        }
        self.update_state_root();
        Ok(())
    }

    fn get_storage(&self, address: &Address, key: &StorageKey) -> VmResult<Option<StorageValue>> {
        Ok(self
            .storage
            .get(address)
            .and_then(|slots| slots.get(key))
            .copied())
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> VmResult<()> {
        let slots = self.storage.entry(address).or_default();

        if value.is_zero() {
            slots.remove(&key);
            if slots.is_empty() {
                self.storage.remove(&address);
            }
        } else {
            slots.insert(key, value);
        }

        self.update_state_root();
        Ok(())
    }

    fn get_code(&self, address: &Address) -> VmResult<Option<Vec<u8>>> {
        Ok(self.code.get(address).cloned())
    }

    fn set_code(&mut self, address: Address, code: Vec<u8>) -> VmResult<()> {
        if code.is_empty() {
            self.code.remove(&address);
        } else {
            self.code.insert(address, code);
        }
        self.update_state_root();
        Ok(())
    }

    fn apply_changes(&mut self, changes: AccountChanges) -> VmResult<()> {
        for (address, account) in changes.accounts {
            self.set_account(address, account)?;
        }

        for (address, slots) in changes.storage {
            for (key, value) in slots {
                self.set_storage(address, key, value)?;
            }
        }

        for (address, code) in changes.code {
            self.set_code(address, code)?;
        }

        Ok(())
    }

    fn state_root(&self) -> Hash {
        self.state_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_state_db() {
        let mut state = MemoryStateDB::new();
        let address = Address::new([1u8; 20]);

        assert!(state.get_account(&address).unwrap().is_none());

        let account = Account::with_balance(1000);
        state.set_account(address, account.clone()).unwrap();
        assert_eq!(state.get_account(&address).unwrap().unwrap().balance, 1000);

        let key = Hash::from_low_u64_be(3);
        let value = Hash::from_low_u64_be(42);
        state.set_storage(address, key, value).unwrap();
        assert_eq!(state.get_storage(&address, &key).unwrap(), Some(value));

        let code = vec![0x60, 0x00];
        state.set_code(address, code.clone()).unwrap();
        assert_eq!(state.get_code(&address).unwrap().unwrap(), code);
    }

    #[test]
    fn test_zero_storage_value_is_not_materialized() {
        let mut state = MemoryStateDB::new();
        let address = Address::new([1u8; 20]);
        let key = Hash::from_low_u64_be(0);

        state
            .set_storage(address, key, Hash::from_low_u64_be(5))
            .unwrap();
        assert!(state.get_storage(&address, &key).unwrap().is_some());

        state.set_storage(address, key, Hash::zero()).unwrap();
        assert_eq!(state.get_storage(&address, &key).unwrap(), None);
    }

    #[test]
    fn test_apply_changes() {
        let mut state = MemoryStateDB::new();
        let address = Address::new([1u8; 20]);

        let mut changes = AccountChanges::new();
        changes.update_account(address, Account::with_balance(1000));
        changes.update_storage(address, Hash::from_low_u64_be(0), Hash::from_low_u64_be(1));
        changes.update_code(address, vec![0xbe, 0xef]);

        state.apply_changes(changes).unwrap();

        assert_eq!(state.get_account(&address).unwrap().unwrap().balance, 1000);
        assert_eq!(
            state
                .get_storage(&address, &Hash::from_low_u64_be(0))
                .unwrap(),
            Some(Hash::from_low_u64_be(1))
        );
        assert_eq!(state.get_code(&address).unwrap().unwrap(), vec![0xbe, 0xef]);
    }

    #[test]
    fn test_state_root_tracks_contents() {
        let mut state = MemoryStateDB::new();
        let root0 = state.state_root();

        let address = Address::new([1u8; 20]);
        state
            .set_account(address, Account::with_balance(1))
            .unwrap();
        let root1 = state.state_root();
        assert_ne!(root0, root1);

        // Removing the account restores the empty root
        state.set_account(address, Account::new()).unwrap();
        assert_eq!(state.state_root(), root0);
    }
}
