//! Code-executor boundary
//!
//! The opcode-level interpreter lives outside this core. The transition
//! function talks to it through this narrow seam: code, input, value, and a
//! gas grant go in; output bytes, remaining gas, a verdict, and any storage
//! writes the code performed come out. The executor never holds a handle to
//! the account store.

use shard_core::{Gas, StorageKey, StorageValue, Wei};

/// One invocation of the code executor
#[derive(Debug, Clone, Copy)]
pub struct ExecutorCall<'a> {
    /// Code to execute (runtime code for calls, init code for creation)
    pub code: &'a [u8],
    /// Call input data
    pub input: &'a [u8],
    /// Value carried by the enclosing transaction
    pub value: Wei,
    /// Gas granted to this invocation
    pub gas: Gas,
}

/// Executor verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorVerdict {
    /// Execution completed
    Success,
    /// Gas grant exhausted before completion
    OutOfGas,
    /// Execution failed for an executor-internal reason
    Failure(String),
}

/// What came back from one executor invocation
#[derive(Debug, Clone)]
pub struct ExecutorOutcome {
    /// Return data (the runtime code, for a creation invocation)
    pub output: Vec<u8>,
    /// Gas left from the grant
    pub gas_remaining: Gas,
    /// Success/failure verdict
    pub verdict: ExecutorVerdict,
    /// Storage writes the code performed against the executing account
    pub storage_writes: Vec<(StorageKey, StorageValue)>,
}

impl ExecutorOutcome {
    /// Successful outcome
    pub fn success(output: Vec<u8>, gas_remaining: Gas) -> Self {
        Self {
            output,
            gas_remaining,
            verdict: ExecutorVerdict::Success,
            storage_writes: Vec::new(),
        }
    }

    /// Gas grant exhausted
    pub fn out_of_gas() -> Self {
        Self {
            output: Vec::new(),
            gas_remaining: 0,
            verdict: ExecutorVerdict::OutOfGas,
            storage_writes: Vec::new(),
        }
    }

    /// Executor-internal failure
    pub fn failure(reason: impl Into<String>, gas_remaining: Gas) -> Self {
        Self {
            output: Vec::new(),
            gas_remaining,
            verdict: ExecutorVerdict::Failure(reason.into()),
            storage_writes: Vec::new(),
        }
    }

    /// Attach storage writes
    pub fn with_storage_writes(mut self, writes: Vec<(StorageKey, StorageValue)>) -> Self {
        self.storage_writes = writes;
        self
    }

    /// Whether the verdict is `Success`
    pub fn is_success(&self) -> bool {
        self.verdict == ExecutorVerdict::Success
    }
}

/// The interpreter seam.
///
/// Implementations must be synchronous and bounded by the gas grant: an
/// invocation that would run forever must stop itself and report `OutOfGas`.
pub trait CodeExecutor {
    /// Execute `code` with the given input, value, and gas grant
    fn execute(&self, call: ExecutorCall<'_>) -> ExecutorOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let ok = ExecutorOutcome::success(vec![0xbe, 0xef], 100);
        assert!(ok.is_success());
        assert_eq!(ok.gas_remaining, 100);

        let oog = ExecutorOutcome::out_of_gas();
        assert_eq!(oog.verdict, ExecutorVerdict::OutOfGas);
        assert_eq!(oog.gas_remaining, 0);

        let failed = ExecutorOutcome::failure("bad opcode", 42);
        assert_eq!(
            failed.verdict,
            ExecutorVerdict::Failure("bad opcode".to_string())
        );
        assert!(!failed.is_success());
    }
}
