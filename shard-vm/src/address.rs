//! Deterministic contract-address derivation

use sha3::{Digest, Keccak256};
use shard_core::{Address, Hash};

/// Creation-scheme discriminator byte, a protocol constant.
///
/// The preimage layout it discriminates is:
/// `CREATION_SCHEME_ID || initiator (20 bytes) || salt (32 bytes, zero when
/// absent) || keccak256(init_code)`. The low 20 bytes of the Keccak-256
/// digest of that preimage form the contract address.
pub const CREATION_SCHEME_ID: u8 = 0x53;

/// Derive the canonical contract address for `(initiator, init_code, salt)`.
///
/// Pure and deterministic: for a fixed input triple the output is
/// byte-identical across runs. This is what lets a transaction pre-declare
/// its own creation target and have it verified rather than observed.
pub fn derive_contract_address(
    initiator: &Address,
    init_code: &[u8],
    salt: Option<&Hash>,
) -> Address {
    let code_hash = Keccak256::digest(init_code);

    let mut hasher = Keccak256::new();
    hasher.update([CREATION_SCHEME_ID]);
    hasher.update(initiator.as_bytes());
    hasher.update(salt.map(|s| *s.as_bytes()).unwrap_or([0u8; 32]));
    hasher.update(code_hash);
    let digest = hasher.finalize();

    Address::from_slice(&digest[12..32])
}
