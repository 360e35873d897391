//! Transaction application

use crate::address::derive_contract_address;
use crate::computation::Computation;
use crate::executor::{CodeExecutor, ExecutorCall, ExecutorOutcome, ExecutorVerdict};
use crate::gas::{GasMeter, GasSchedule};
use crate::session::{StateStore, WriteSession};
use crate::{ComputationError, VmError, VmResult};
use shard_core::{Address, BlockHeader, Receipt, Transaction, Wei};
use tracing::{debug, info, warn};

/// What a successful branch application produced
struct Applied {
    output: Vec<u8>,
    created: Option<Address>,
}

/// The transaction-application context: account state, the enclosing block's
/// header (whose `gas_used` field is the running accumulator), the gas
/// schedule, and the code executor.
///
/// Passed explicitly wherever it is needed; there is no ambient global.
pub struct ShardVm<E: CodeExecutor> {
    state: StateStore,
    header: BlockHeader,
    schedule: GasSchedule,
    executor: E,
}

impl<E: CodeExecutor> ShardVm<E> {
    /// Create a VM over the given state and block header, with the default
    /// gas schedule
    pub fn new(state: StateStore, header: BlockHeader, executor: E) -> Self {
        Self::with_schedule(state, header, GasSchedule::default(), executor)
    }

    /// Create a VM with an explicit gas schedule
    pub fn with_schedule(
        state: StateStore,
        header: BlockHeader,
        schedule: GasSchedule,
        executor: E,
    ) -> Self {
        Self {
            state,
            header,
            schedule,
            executor,
        }
    }

    /// The enclosing block's header
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// The account state handle
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// The gas schedule in force
    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    /// Apply one transaction against the current state.
    ///
    /// Structural problems (malformed transaction, allowance below intrinsic
    /// gas) are rejected as `Err` before anything is charged. Everything
    /// else produces a `Computation`: on failure the session is discarded
    /// and only the gas consumed up to the failure point remains visible,
    /// accumulated into the header's `gas_used`.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> VmResult<(Computation, Receipt)> {
        validate_shape(tx)?;
        let tx_hash = tx.hash()?;

        let intrinsic = self.schedule.intrinsic_gas(tx);
        if intrinsic > tx.gas_limit {
            return Err(VmError::IntrinsicGasTooHigh {
                intrinsic,
                allowance: tx.gas_limit,
            });
        }

        debug!(
            "applying transaction {} (intrinsic gas {})",
            tx_hash, intrinsic
        );

        let mut meter = GasMeter::new(tx.gas_limit, self.schedule.clone());
        meter.consume(intrinsic, "intrinsic")?;

        let mut session = self.state.write_session();
        let applied = if tx.is_creation() {
            self.apply_creation(tx, &mut session, &mut meter)
        } else {
            self.apply_call(tx, &mut session, &mut meter)
        };

        let gas_used = meter.consumed();
        let (computation, contract_address) = match applied {
            Ok(applied) => {
                session.commit()?;
                (Computation::success(applied.output, gas_used), applied.created)
            }
            Err(VmError::Computation(error)) => {
                session.discard();
                warn!("transaction {} failed: {}", tx_hash, error);
                (Computation::failure(error, gas_used), None)
            }
            Err(fatal) => return Err(fatal),
        };

        self.header.gas_used += gas_used;

        let receipt = Receipt {
            transaction_hash: tx_hash,
            initiator: tx.initiator,
            destination: tx.destination,
            gas_used,
            cumulative_gas_used: self.header.gas_used,
            status: if computation.is_error() { 0 } else { 1 },
            contract_address,
        };

        Ok((computation, receipt))
    }

    /// Message call: transfer value, then run the destination's code if any
    fn apply_call(
        &self,
        tx: &Transaction,
        session: &mut WriteSession<'_>,
        meter: &mut GasMeter,
    ) -> VmResult<Applied> {
        let destination = tx
            .destination
            .ok_or_else(|| VmError::InvalidTransaction("message call without destination".into()))?;

        meter.consume_transfer()?;
        transfer(session, &tx.initiator, &destination, tx.value)?;

        let code = session.get_code(&destination)?;
        if code.is_empty() {
            debug!("bare value transfer to {}", destination);
            return Ok(Applied {
                output: Vec::new(),
                created: None,
            });
        }

        meter.consume_contract_call()?;
        let outcome = self.executor.execute(ExecutorCall {
            code: &code,
            input: &tx.data,
            value: tx.value,
            gas: meter.remaining(),
        });
        let output = settle_executor(outcome, session, &destination, meter)?;

        Ok(Applied {
            output,
            created: None,
        })
    }

    /// Contract creation: validate the declared target against the derived
    /// address, check for collision, transfer the endowment, run the init
    /// code, and persist the runtime code it returns.
    fn apply_creation(
        &self,
        tx: &Transaction,
        session: &mut WriteSession<'_>,
        meter: &mut GasMeter,
    ) -> VmResult<Applied> {
        meter.consume_contract_creation()?;

        let derived = derive_contract_address(&tx.initiator, &tx.code, tx.salt.as_ref());
        let declared = tx.declared_creation_target().ok_or_else(|| {
            VmError::InvalidTransaction("creation transaction without declared target".into())
        })?;

        // The declaration check comes before the collision check and before
        // any balance movement; a bad declaration wins over everything else.
        if declared != derived {
            debug!(
                "creation address mismatch: declared {}, derived {}",
                declared, derived
            );
            return Err(ComputationError::IncorrectContractCreationAddress { declared, derived }.into());
        }

        if session.account_exists(&derived)? {
            return Err(ComputationError::ContractCreationCollision { address: derived }.into());
        }

        transfer(session, &tx.initiator, &derived, tx.value)?;

        let outcome = self.executor.execute(ExecutorCall {
            code: &tx.code,
            input: &tx.data,
            value: tx.value,
            gas: meter.remaining(),
        });
        let runtime_code = settle_executor(outcome, session, &derived, meter)?;

        session.set_code(&derived, runtime_code.clone())?;
        session.set_nonce(&derived, 1)?;
        info!(
            "contract created at {} ({} bytes of runtime code)",
            derived,
            runtime_code.len()
        );

        Ok(Applied {
            output: runtime_code,
            created: Some(derived),
        })
    }
}

/// Structural validation, before any gas is charged
fn validate_shape(tx: &Transaction) -> VmResult<()> {
    if tx.gas_limit == 0 {
        return Err(VmError::InvalidTransaction(
            "gas limit cannot be zero".into(),
        ));
    }
    if tx.is_creation() {
        if tx.declared_creation_target().is_none() {
            return Err(VmError::InvalidTransaction(
                "creation transaction must declare its target in the access list's second slot"
                    .into(),
            ));
        }
    } else if !tx.code.is_empty() {
        return Err(VmError::InvalidTransaction(
            "message call carries creation code".into(),
        ));
    }
    Ok(())
}

/// Move value between accounts inside the session buffer
fn transfer(
    session: &mut WriteSession<'_>,
    from: &Address,
    to: &Address,
    value: Wei,
) -> VmResult<()> {
    if value == 0 {
        return Ok(());
    }
    session.sub_balance(from, value)?;
    session.add_balance(to, value)?;
    Ok(())
}

/// Settle gas with the executor and map its verdict into this core's error
/// taxonomy. Storage writes are buffered only on success.
fn settle_executor(
    outcome: ExecutorOutcome,
    session: &mut WriteSession<'_>,
    target: &Address,
    meter: &mut GasMeter,
) -> VmResult<Vec<u8>> {
    let granted = meter.remaining();
    match outcome.verdict {
        ExecutorVerdict::Success => {
            let spent = granted.saturating_sub(outcome.gas_remaining);
            meter.consume(spent, "execute")?;
            for (key, value) in outcome.storage_writes {
                session.set_storage(target, key, value)?;
            }
            Ok(outcome.output)
        }
        ExecutorVerdict::OutOfGas => {
            meter.consume(granted, "execute")?;
            Err(ComputationError::OutOfGas {
                required: granted,
                available: 0,
            }
            .into())
        }
        ExecutorVerdict::Failure(reason) => {
            let spent = granted.saturating_sub(outcome.gas_remaining);
            meter.consume(spent, "execute")?;
            Err(ComputationError::ExecutorFailure(reason).into())
        }
    }
}
