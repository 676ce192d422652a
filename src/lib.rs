//! Deferred, composable Ethereum transactions
//!
//! A [`Transaction`] describes a transaction and an optional pipeline of steps
//! over its result without committing to send it. It can be gas-estimated at
//! any stage; only `transact` submits. Once sent, [`wait_for_receipt`] and
//! [`wait_for_contract`] confirm that it was mined, and that a deployment
//! actually stored code.

pub mod chain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod tx;

#[cfg(test)]
mod testing;

pub use chain::{
    connect, wait_for_contract, wait_for_receipt, ContractWaiter, DynProvider, ReceiptWaiter,
    RpcProvider, WaitParams,
};
pub use error::{TxError, TxResult};
pub use tx::{GasEstimator, Transaction, TxOptions};
