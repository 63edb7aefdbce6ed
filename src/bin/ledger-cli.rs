#![forbid(unsafe_code)]
//! Offline inspection and editing of a HashLedger database.

use clap::Parser;
use colored::*;
use hashledger::cli::{
    blocks_table, describe_block, describe_report, load_ledger_from_config, Commands, LedgerCli,
};
use hashledger::logging::{init_logging, LogFormat};
use std::process::ExitCode;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = LedgerCli::parse();
    let config = cli.resolve_config()?;

    // Keep stdout for command output; only warnings go to stderr.
    init_logging("warn", LogFormat::from_str_lossy(&config.logging.format));

    let ledger = load_ledger_from_config(&config)?;

    match cli.command {
        Commands::List => {
            println!("{}", blocks_table(&ledger.get_all()));
            println!("{}", format!("{} block(s)", ledger.len()).dimmed());
        }
        Commands::Show { id } => {
            println!("{}", describe_block(&ledger.get(id)?));
        }
        Commands::Append { data } => {
            let block = ledger.append(&data)?;
            println!("{} appended", format!("Block #{}", block.id).green().bold());
            println!("{}", describe_block(&block));
        }
        Commands::Tamper { id, data } => {
            let block = ledger.tamper(id, &data)?;
            println!(
                "{}",
                format!("Block #{} overwritten without rehashing", block.id)
                    .yellow()
                    .bold()
            );
            println!("{}", describe_block(&block));
        }
        Commands::Verify => {
            let report = ledger.verify();
            println!("{}", describe_report(&report));
            if !report.valid {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
