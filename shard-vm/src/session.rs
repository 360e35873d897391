//! Session layer over the backing state database
//!
//! A `StateStore` hands out scoped views of the state: `ReadSession` for
//! inspection and `WriteSession` for transactional mutation. The store's
//! lock is the session discipline itself: exactly one mutable session can
//! exist at a time, and read sessions never overlap with it.

use crate::account::{Account, AccountChanges};
use crate::state::{MemoryStateDB, StateDB};
use crate::VmResult;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shard_core::{Address, Hash, Nonce, StorageKey, StorageValue, Wei};
use sha3::{Digest, Keccak256};
use std::sync::Arc;

/// Shared handle to the account state.
///
/// Cloning the handle shares the underlying store; sessions opened through
/// any clone observe the same state.
pub struct StateStore {
    inner: Arc<RwLock<Box<dyn StateDB>>>,
}

impl StateStore {
    /// Create a store over an arbitrary backing database
    pub fn new(state_db: Box<dyn StateDB>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state_db)),
        }
    }

    /// Create a store backed by in-memory state
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStateDB::new()))
    }

    /// Open a read-only session. Blocks while a mutable session is open.
    pub fn read_session(&self) -> ReadSession<'_> {
        ReadSession {
            guard: self.inner.read(),
        }
    }

    /// Open a mutable session. Blocks until all other sessions are closed;
    /// at most one mutable session exists at a time.
    pub fn write_session(&self) -> WriteSession<'_> {
        WriteSession {
            guard: self.inner.write(),
            pending: AccountChanges::new(),
        }
    }

    /// Current state root
    pub fn state_root(&self) -> Hash {
        self.inner.read().state_root()
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only view of committed state.
///
/// Mutation is impossible by construction: this type has no writing methods.
pub struct ReadSession<'a> {
    guard: RwLockReadGuard<'a, Box<dyn StateDB>>,
}

impl ReadSession<'_> {
    /// Get account balance
    pub fn get_balance(&self, address: &Address) -> VmResult<Wei> {
        Ok(self
            .guard
            .get_account(address)?
            .map(|account| account.balance)
            .unwrap_or(0))
    }

    /// Get account nonce
    pub fn get_nonce(&self, address: &Address) -> VmResult<Nonce> {
        Ok(self
            .guard
            .get_account(address)?
            .map(|account| account.nonce)
            .unwrap_or(0))
    }

    /// Get contract code (empty for non-contracts)
    pub fn get_code(&self, address: &Address) -> VmResult<Vec<u8>> {
        Ok(self.guard.get_code(address)?.unwrap_or_default())
    }

    /// Get storage value (zero for unset slots)
    pub fn get_storage(&self, address: &Address, key: &StorageKey) -> VmResult<StorageValue> {
        Ok(self.guard.get_storage(address, key)?.unwrap_or_default())
    }

    /// Whether the address is occupied (nonzero nonce or non-empty code)
    pub fn account_exists(&self, address: &Address) -> VmResult<bool> {
        Ok(self
            .guard
            .get_account(address)?
            .map(|account| account.is_occupied())
            .unwrap_or(false))
    }
}

/// Mutable, transactional view of the state.
///
/// Writes are buffered; nothing reaches the backing store until `commit`.
/// Dropping the session without committing discards every buffered write,
/// so rollback is guaranteed on all exit paths, error exits included.
pub struct WriteSession<'a> {
    guard: RwLockWriteGuard<'a, Box<dyn StateDB>>,
    pending: AccountChanges,
}

impl WriteSession<'_> {
    /// Account record as this session sees it (buffered writes included)
    fn load_account(&self, address: &Address) -> VmResult<Account> {
        if let Some(account) = self.pending.account(address) {
            return Ok(account.clone());
        }
        Ok(self.guard.get_account(address)?.unwrap_or_default())
    }

    /// Get account balance
    pub fn get_balance(&self, address: &Address) -> VmResult<Wei> {
        Ok(self.load_account(address)?.balance)
    }

    /// Set account balance
    pub fn set_balance(&mut self, address: &Address, balance: Wei) -> VmResult<()> {
        let mut account = self.load_account(address)?;
        account.balance = balance;
        self.pending.update_account(*address, account);
        Ok(())
    }

    /// Add to an account's balance
    pub fn add_balance(&mut self, address: &Address, amount: Wei) -> VmResult<()> {
        let mut account = self.load_account(address)?;
        account.add_balance(amount)?;
        self.pending.update_account(*address, account);
        Ok(())
    }

    /// Subtract from an account's balance; fails with `InsufficientBalance`
    /// when the balance would go negative
    pub fn sub_balance(&mut self, address: &Address, amount: Wei) -> VmResult<()> {
        let mut account = self.load_account(address)?;
        account.sub_balance(amount)?;
        self.pending.update_account(*address, account);
        Ok(())
    }

    /// Get account nonce
    pub fn get_nonce(&self, address: &Address) -> VmResult<Nonce> {
        Ok(self.load_account(address)?.nonce)
    }

    /// Set account nonce
    pub fn set_nonce(&mut self, address: &Address, nonce: Nonce) -> VmResult<()> {
        let mut account = self.load_account(address)?;
        account.nonce = nonce;
        self.pending.update_account(*address, account);
        Ok(())
    }

    /// Get contract code (empty for non-contracts)
    pub fn get_code(&self, address: &Address) -> VmResult<Vec<u8>> {
        if let Some(code) = self.pending.code(address) {
            return Ok(code.clone());
        }
        Ok(self.guard.get_code(address)?.unwrap_or_default())
    }

    /// Set contract code, keeping the account's code hash in step
    pub fn set_code(&mut self, address: &Address, code: Vec<u8>) -> VmResult<()> {
        let mut account = self.load_account(address)?;
        let code_hash = if code.is_empty() {
            Hash::zero()
        } else {
            Hash::from_slice(Keccak256::digest(&code).as_slice())
        };
        account.set_code_hash(code_hash);
        self.pending.update_account(*address, account);
        self.pending.update_code(*address, code);
        Ok(())
    }

    /// Get storage value (zero for unset slots)
    pub fn get_storage(&self, address: &Address, key: &StorageKey) -> VmResult<StorageValue> {
        if let Some(value) = self.pending.storage_value(address, key) {
            return Ok(value);
        }
        Ok(self.guard.get_storage(address, key)?.unwrap_or_default())
    }

    /// Set storage value (zero clears the slot)
    pub fn set_storage(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> VmResult<()> {
        self.pending.update_storage(*address, key, value);
        Ok(())
    }

    /// Whether the address is occupied (nonzero nonce or non-empty code)
    pub fn account_exists(&self, address: &Address) -> VmResult<bool> {
        Ok(self.load_account(address)?.is_occupied())
    }

    /// Atomically apply all buffered writes to the backing store
    pub fn commit(mut self) -> VmResult<()> {
        let changes = std::mem::take(&mut self.pending);
        self.guard.apply_changes(changes)
    }

    /// Drop all buffered writes, leaving the backing store untouched
    pub fn discard(self) {
        // Dropping the session is the rollback.
    }
}
