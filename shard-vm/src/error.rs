//! VM error types

use shard_core::{Address, CoreError, Gas, Wei};
use thiserror::Error;

/// Closed taxonomy of per-transaction computation failures.
///
/// These are non-fatal to the surrounding chain: the session is rolled back,
/// gas consumed up to the failure point stays charged, and processing moves
/// on to the next transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputationError {
    /// Declared creation target does not match the derived address
    #[error("incorrect contract creation address: declared {declared}, derived {derived}")]
    IncorrectContractCreationAddress { declared: Address, derived: Address },

    /// Derived creation address is already occupied
    #[error("contract creation collision at {address}")]
    ContractCreationCollision { address: Address },

    /// Value transfer would drive a balance negative
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Wei, available: Wei },

    /// Gas allowance exhausted before completion
    #[error("out of gas: required {required}, available {available}")]
    OutOfGas { required: Gas, available: Gas },

    /// Any other executor-reported failure
    #[error("executor failure: {0}")]
    ExecutorFailure(String),
}

/// VM error type for structural and fatal failures.
///
/// Structural errors reject the transaction before a `Computation` exists and
/// charge nothing. The `Computation` variant is an internal carrier only: it
/// is converted into a failed `Computation` before `apply_transaction`
/// returns.
#[derive(Error, Debug)]
pub enum VmError {
    /// Malformed transaction, rejected before any gas is charged
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Gas allowance cannot cover the intrinsic cost
    #[error("intrinsic gas {intrinsic} exceeds allowance {allowance}")]
    IntrinsicGasTooHigh { intrinsic: Gas, allowance: Gas },

    /// Backing store violated its contract
    #[error("state error: {0}")]
    State(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
