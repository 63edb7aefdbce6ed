#![forbid(unsafe_code)]
//! HTTP node for HashLedger

use std::sync::Arc;

use clap::Parser;
use hashledger::cli::ServerCli;
use hashledger::logging::{init_logging, LogFormat};
use hashledger::node::Node;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = ServerCli::parse();
    let config = cli.resolve_config()?;

    init_logging(
        &config.logging.level,
        LogFormat::from_str_lossy(&config.logging.format),
    );
    tracing::info!(
        bind = %config.bind_address(),
        database = %config.database.path,
        "starting HashLedger node"
    );

    let node = Arc::new(Node::init(config)?);
    node.start().await?;

    tracing::info!("node stopped");
    Ok(())
}
