//! Shared fixtures for unit tests

use crate::chain::{DynProvider, MockRpcProvider};
use crate::tx::TxOptions;

use ethers::providers::ProviderError;
use ethers::types::{Address, TransactionReceipt, H160, H256, U256, U64};
use std::sync::Arc;

pub const SENDER: Address = H160([
    0xe8, 0xd3, 0x26, 0x6f, 0x3c, 0x4f, 0x08, 0x3a, 0xb8, 0x86, 0x4b, 0x5e, 0x04, 0xae, 0xa7,
    0xb0, 0x87, 0x04, 0x4e, 0x49,
]);

pub const RECIPIENT: Address = H160([
    0x79, 0x67, 0xc4, 0xf4, 0x51, 0x21, 0x95, 0xba, 0x83, 0xae, 0x8f, 0x08, 0xca, 0x30, 0xf7,
    0xb1, 0x45, 0xbe, 0x6c, 0xf8,
]);

pub const DESTINATION: Address = H160([
    0x53, 0x3e, 0x20, 0xfb, 0x3d, 0xf2, 0xa6, 0x2b, 0x3f, 0xd6, 0xc5, 0x69, 0xe8, 0xa2, 0x37,
    0x01, 0xb8, 0x4d, 0xee, 0x85,
]);

pub const STUB_TX_HASH: H256 = H256([0xab; 32]);

pub const GAS_ESTIMATE: u64 = 21_000;

/// A plain value transfer of 1,000,000 wei
pub fn sample_options() -> TxOptions {
    TxOptions::new()
        .from(SENDER)
        .to(RECIPIENT)
        .value(U256::from(1_000_000u64))
}

pub fn receipt(tx_hash: H256, block_number: u64) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash,
        block_number: Some(U64::from(block_number)),
        ..Default::default()
    }
}

pub fn provider_error(message: &str) -> ProviderError {
    ProviderError::CustomError(message.to_string())
}

pub fn into_dyn(mock: MockRpcProvider) -> DynProvider {
    Arc::new(mock)
}
