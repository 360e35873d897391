//! Gas metering and scheduling

use crate::ComputationError;
use serde::{Deserialize, Serialize};
use shard_core::{Gas, Transaction};
use std::collections::HashMap;

/// Gas costs for the operations this core charges for.
///
/// These are protocol constants: every implementation must charge the same
/// amounts or block gas totals diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Base transaction cost
    pub tx_base: Gas,
    /// Cost per byte of transaction payload data
    pub tx_data_per_byte: Gas,
    /// Cost per access-list entry
    pub access_list_address: Gas,
    /// Cost per storage key declared in an access-list entry
    pub access_list_storage_key: Gas,
    /// Contract creation surcharge
    pub contract_creation: Gas,
    /// Balance transfer surcharge
    pub balance_transfer: Gas,
    /// Surcharge for invoking code at a call destination
    pub contract_call: Gas,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            tx_base: 21_000,
            tx_data_per_byte: 68,
            access_list_address: 2_400,
            access_list_storage_key: 1_900,
            contract_creation: 32_000,
            balance_transfer: 9_000,
            contract_call: 700,
        }
    }
}

impl GasSchedule {
    /// Load gas schedule from TOML configuration
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Intrinsic gas cost of a transaction.
    ///
    /// A pure function of the transaction's shape, never of execution
    /// outcome: base cost, payload bytes, and the declared access list.
    /// It is owed unconditionally, even when the transaction later fails.
    pub fn intrinsic_gas(&self, tx: &Transaction) -> Gas {
        let mut gas = self.tx_base + tx.data.len() as Gas * self.tx_data_per_byte;
        for entry in &tx.access_list {
            gas += self.access_list_address
                + entry.storage_keys.len() as Gas * self.access_list_storage_key;
        }
        gas
    }
}

/// Gas meter for tracking consumption within one transaction
#[derive(Debug, Clone)]
pub struct GasMeter {
    /// Gas allowance for the transaction
    limit: Gas,
    /// Gas consumed so far
    consumed: Gas,
    /// Gas schedule
    schedule: GasSchedule,
    /// Consumption by operation label
    breakdown: HashMap<String, Gas>,
}

impl GasMeter {
    /// Create a new gas meter
    pub fn new(limit: Gas, schedule: GasSchedule) -> Self {
        Self {
            limit,
            consumed: 0,
            schedule,
            breakdown: HashMap::new(),
        }
    }

    /// Get remaining gas
    pub fn remaining(&self) -> Gas {
        self.limit.saturating_sub(self.consumed)
    }

    /// Get consumed gas
    pub fn consumed(&self) -> Gas {
        self.consumed
    }

    /// Get gas allowance
    pub fn limit(&self) -> Gas {
        self.limit
    }

    /// Consume gas for an operation
    pub fn consume(&mut self, amount: Gas, operation: &str) -> Result<(), ComputationError> {
        if amount > self.remaining() {
            return Err(ComputationError::OutOfGas {
                required: amount,
                available: self.remaining(),
            });
        }
        self.consumed += amount;
        *self.breakdown.entry(operation.to_string()).or_insert(0) += amount;
        Ok(())
    }

    /// Consume the contract-creation surcharge
    pub fn consume_contract_creation(&mut self) -> Result<(), ComputationError> {
        let cost = self.schedule.contract_creation;
        self.consume(cost, "contract_creation")
    }

    /// Consume the balance-transfer surcharge
    pub fn consume_transfer(&mut self) -> Result<(), ComputationError> {
        let cost = self.schedule.balance_transfer;
        self.consume(cost, "transfer")
    }

    /// Consume the contract-call surcharge
    pub fn consume_contract_call(&mut self) -> Result<(), ComputationError> {
        let cost = self.schedule.contract_call;
        self.consume(cost, "contract_call")
    }

    /// Get gas consumption breakdown
    pub fn breakdown(&self) -> &HashMap<String, Gas> {
        &self.breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shard_core::{AccessListEntry, Address, Hash};

    #[test]
    fn test_gas_schedule_default() {
        let schedule = GasSchedule::default();
        assert_eq!(schedule.tx_base, 21_000);
        assert_eq!(schedule.tx_data_per_byte, 68);
        assert_eq!(schedule.access_list_address, 2_400);
        assert_eq!(schedule.access_list_storage_key, 1_900);
    }

    #[test]
    fn test_gas_schedule_toml_round_trip() {
        let schedule = GasSchedule::default();
        let toml_str = schedule.to_toml().unwrap();
        let parsed = GasSchedule::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.tx_base, schedule.tx_base);
        assert_eq!(parsed.contract_creation, schedule.contract_creation);
    }

    #[test]
    fn test_intrinsic_gas_shape() {
        let schedule = GasSchedule::default();
        let initiator = Address::new([1u8; 20]);

        let plain = Transaction::call(initiator, Address::new([2u8; 20]), 0, vec![], 100_000);
        // One access-list entry (the initiator) comes with the constructor
        assert_eq!(schedule.intrinsic_gas(&plain), 21_000 + 2_400);

        let mut with_data = plain.clone();
        with_data.data = vec![0u8; 10];
        assert_eq!(schedule.intrinsic_gas(&with_data), 21_000 + 680 + 2_400);

        let mut with_keys = plain.clone();
        with_keys.access_list.push(AccessListEntry::with_keys(
            Address::new([3u8; 20]),
            vec![Hash::zero(), Hash::from_low_u64_be(1)],
        ));
        // 1 * 2400 + (2400 + 2 * 1900) for the second entry
        assert_eq!(
            schedule.intrinsic_gas(&with_keys),
            21_000 + 2_400 + 2_400 + 3_800
        );
    }

    #[test]
    fn test_gas_meter_basic() {
        let mut meter = GasMeter::new(100_000, GasSchedule::default());

        assert_eq!(meter.remaining(), 100_000);
        assert_eq!(meter.consumed(), 0);

        meter.consume(1000, "test").unwrap();
        assert_eq!(meter.consumed(), 1000);
        assert_eq!(meter.remaining(), 99_000);
        assert_eq!(meter.breakdown()["test"], 1000);
    }

    #[test]
    fn test_gas_meter_out_of_gas() {
        let mut meter = GasMeter::new(1000, GasSchedule::default());

        let err = meter.consume(2000, "test").unwrap_err();
        match err {
            ComputationError::OutOfGas {
                required,
                available,
            } => {
                assert_eq!(required, 2000);
                assert_eq!(available, 1000);
            }
            other => panic!("expected OutOfGas, got {other:?}"),
        }
        // A failed charge consumes nothing
        assert_eq!(meter.consumed(), 0);
    }

    #[test]
    fn test_gas_meter_exact_limit() {
        let mut meter = GasMeter::new(1000, GasSchedule::default());
        meter.consume(1000, "test").unwrap();
        assert_eq!(meter.remaining(), 0);
        assert!(meter.consume(1, "test").is_err());
    }

    proptest! {
        #[test]
        fn prop_intrinsic_gas_monotone_in_data(
            len_a in 0usize..512,
            extra in 1usize..64,
        ) {
            let schedule = GasSchedule::default();
            let initiator = Address::new([1u8; 20]);

            let mut shorter = Transaction::call(
                initiator, Address::new([2u8; 20]), 0, vec![0u8; len_a], 100_000,
            );
            let mut longer = shorter.clone();
            longer.data = vec![0u8; len_a + extra];

            prop_assert!(schedule.intrinsic_gas(&longer) > schedule.intrinsic_gas(&shorter));

            // And monotone in declared access-list entries
            shorter.access_list.push(AccessListEntry::address_only(Address::new([3u8; 20])));
            let base = Transaction::call(
                initiator, Address::new([2u8; 20]), 0, vec![0u8; len_a], 100_000,
            );
            prop_assert!(schedule.intrinsic_gas(&shorter) > schedule.intrinsic_gas(&base));
        }
    }
}
