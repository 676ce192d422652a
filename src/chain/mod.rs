//! Chain module - node access and confirmation waiting
//!
//! This module provides:
//! - The `RpcProvider` contract and its JSON-RPC implementation
//! - Receipt waiting on a block filter with an immediate first check
//! - Contract deployment verification on top of receipt waiting

pub mod contract;
pub mod provider;
pub mod receipt;

pub use contract::{wait_for_contract, ContractWaiter};
#[cfg(test)]
pub use provider::MockRpcProvider;
pub use provider::{connect, DynProvider, RpcProvider};
pub use receipt::{wait_for_receipt, ReceiptWaiter, WaitParams, DEFAULT_POLL_INTERVAL};
