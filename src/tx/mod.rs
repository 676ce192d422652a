//! Transaction description, gas resolution and composition

mod gas;
mod options;
mod transaction;

pub use gas::GasEstimator;
pub use options::{TxOptions, GAS_KEY};
pub use transaction::{Continuation, Transaction};
