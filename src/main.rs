//! deferred-tx - wait for an Ethereum transaction to be mined

use anyhow::Result;
use clap::{Parser, Subcommand};
use deferred_tx::config::Settings;
use deferred_tx::{
    connect, ContractWaiter, ReceiptWaiter, RpcProvider, TxError, TxResult, WaitParams,
};
use ethers::types::H256;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "deferred-tx",
    version,
    about = "Wait for an Ethereum transaction to be mined"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the receipt as JSON once the transaction is mined
    Receipt {
        /// Transaction hash (0x-prefixed)
        #[arg(value_parser = parse_tx_hash)]
        tx_hash: H256,
    },
    /// Print the address of the contract created by the transaction
    Contract {
        /// Transaction hash (0x-prefixed)
        #[arg(value_parser = parse_tx_hash)]
        tx_hash: H256,
    },
}

fn parse_tx_hash(s: &str) -> Result<H256, String> {
    s.parse()
        .map_err(|e| format!("invalid transaction hash {:?}: {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging();

    // Load configuration
    let settings = Settings::load()?;
    let params = settings.confirmation.wait_params();

    let provider = connect(&settings.provider).await?;
    info!("Connected to {}", settings.provider.rpc_url);

    let outcome = run(args.command, provider.as_ref(), params).await;

    if settings.metrics.enabled {
        print!("{}", deferred_tx::metrics::render()?);
    }

    outcome
}

async fn run(command: Command, provider: &dyn RpcProvider, params: WaitParams) -> Result<()> {
    match command {
        Command::Receipt { tx_hash } => {
            let receipt = ReceiptWaiter::new(provider, tx_hash)
                .with_params(params)
                .wait_until(shutdown_signal())
                .await;
            if let Some(receipt) = unless_cancelled(receipt)? {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            }
        }
        Command::Contract { tx_hash } => {
            let address = ContractWaiter::new(provider, tx_hash)
                .with_params(params)
                .wait_until(shutdown_signal())
                .await;
            if let Some(address) = unless_cancelled(address)? {
                println!("{:?}", address);
            }
        }
    }
    Ok(())
}

/// `None` when a shutdown signal cut the wait short
fn unless_cancelled<T>(result: TxResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TxError::Cancelled { .. }) => {
            warn!("Shutdown signal received, abandoning wait");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,deferred_tx=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
