//! Per-transaction computation result

use crate::ComputationError;
use shard_core::Gas;

/// The outcome of applying one transaction.
///
/// Constructed exactly once per application and never mutated afterwards;
/// the fields are private and reachable only through accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computation {
    error: Option<ComputationError>,
    output: Vec<u8>,
    gas_used: Gas,
}

impl Computation {
    /// Successful computation with the executor's return data
    pub fn success(output: Vec<u8>, gas_used: Gas) -> Self {
        Self {
            error: None,
            output,
            gas_used,
        }
    }

    /// Failed computation; gas consumed up to the failure point stays charged
    pub fn failure(error: ComputationError, gas_used: Gas) -> Self {
        Self {
            error: Some(error),
            output: Vec::new(),
            gas_used,
        }
    }

    /// Whether any failure occurred during application
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The failure kind, if any
    pub fn error(&self) -> Option<&ComputationError> {
        self.error.as_ref()
    }

    /// Return data (empty on failure)
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Gas consumed by this transaction
    pub fn gas_used(&self) -> Gas {
        self.gas_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let computation = Computation::success(vec![0xbe, 0xef], 30_000);
        assert!(!computation.is_error());
        assert_eq!(computation.error(), None);
        assert_eq!(computation.output(), &[0xbe, 0xef]);
        assert_eq!(computation.gas_used(), 30_000);
    }

    #[test]
    fn test_failure_keeps_gas() {
        let computation = Computation::failure(
            ComputationError::ExecutorFailure("halted".to_string()),
            25_000,
        );
        assert!(computation.is_error());
        assert!(computation.output().is_empty());
        assert_eq!(computation.gas_used(), 25_000);
    }
}
