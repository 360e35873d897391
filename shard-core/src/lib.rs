//! Core data structures for the sharded-VM chain
//!
//! This crate provides the fundamental building blocks shared by every layer:
//! - Basic types (Hash, Address, Gas, Wei, etc.)
//! - The sharding Transaction with its access list
//! - Block header and receipt structures

pub mod block;
pub mod error;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use block::*;
pub use error::*;
pub use transaction::*;
pub use types::*;
