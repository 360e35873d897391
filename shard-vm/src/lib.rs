//! State-transition engine for the sharded-VM chain
//!
//! This crate applies transactions against the account state: it meters gas,
//! derives and validates content-addressed contract creation targets, runs
//! code through the executor boundary, and commits or rolls back the state
//! changes of each transaction atomically.

pub mod account;
pub mod address;
pub mod computation;
pub mod error;
pub mod executor;
pub mod gas;
pub mod session;
pub mod state;
pub mod vm;

pub use account::{Account, AccountChanges};
pub use address::{derive_contract_address, CREATION_SCHEME_ID};
pub use computation::Computation;
pub use error::{ComputationError, VmError, VmResult};
pub use executor::{CodeExecutor, ExecutorCall, ExecutorOutcome, ExecutorVerdict};
pub use gas::{GasMeter, GasSchedule};
pub use session::{ReadSession, StateStore, WriteSession};
pub use state::{MemoryStateDB, StateDB};
pub use vm::ShardVm;
