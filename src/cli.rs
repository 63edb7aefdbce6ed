//! Command-line definitions and helpers shared by the `ledger-server` and
//! `ledger-cli` binaries.

use crate::blockchain::{Block, VerificationReport};
use crate::config::{load_config, load_config_from, Config};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::node::open_database;
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use std::path::{Path, PathBuf};

/// Runs the HashLedger HTTP node.
#[derive(Parser, Debug)]
#[command(name = "ledger-server", version, about = "HashLedger HTTP node")]
pub struct ServerCli {
    /// Path to the configuration file (TOML). Defaults to ./config.toml when present.
    #[arg(long, short = 'c', env = "HASHLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides `server.host`.
    #[arg(long, env = "HASHLEDGER_HOST")]
    pub host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long, short = 'p', env = "HASHLEDGER_PORT")]
    pub port: Option<u16>,

    /// Overrides `database.path`; ":memory:" disables durable storage.
    #[arg(long, env = "HASHLEDGER_DB")]
    pub db: Option<String>,

    /// Overrides `logging.format` ("pretty" or "json").
    #[arg(long)]
    pub log_format: Option<String>,
}

impl ServerCli {
    /// Loads the configuration and applies command-line overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = resolve_config(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Inspects and edits a HashLedger database directly.
#[derive(Parser, Debug)]
#[command(name = "ledger-cli", version, about = "Inspect and verify a HashLedger database")]
pub struct LedgerCli {
    /// Path to the configuration file (TOML). Defaults to ./config.toml when present.
    #[arg(long, short = 'c', env = "HASHLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides `database.path`.
    #[arg(long, env = "HASHLEDGER_DB")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every block.
    List,
    /// Show one block in full.
    Show { id: u64 },
    /// Append a block with the given payload.
    Append { data: String },
    /// Overwrite a block's payload without rehashing it (demonstration only).
    Tamper { id: u64, data: String },
    /// Verify the whole chain; exits with status 1 when it is compromised.
    Verify,
}

impl LedgerCli {
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = resolve_config(self.config.as_deref())?;
        if let Some(db) = &self.db {
            config.database.path = db.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Loads `path` if given, else `config.toml` from the working directory or
/// the defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config_from(p),
        None => load_config(),
    }
}

/// Opens the ledger stored at the configured database path.
///
/// Unlike the server, there is no in-memory fallback: a CLI edit that is
/// not persisted would be silently lost.
pub fn load_ledger_from_config(config: &Config) -> Result<Ledger> {
    let db = open_database(config)?;
    Ledger::open(&config.ledger.genesis_data, Box::new(db))
}

fn short_hash(hash: &str) -> String {
    if hash.len() > 16 {
        format!("{}...{}", &hash[..8], &hash[hash.len() - 8..])
    } else {
        hash.to_string()
    }
}

/// Renders blocks as a table; blocks whose stored hash no longer matches
/// their content are highlighted.
pub fn blocks_table(blocks: &[Block]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Timestamp").add_attribute(Attribute::Bold),
            Cell::new("Data").add_attribute(Attribute::Bold),
            Cell::new("Previous").add_attribute(Attribute::Bold),
            Cell::new("Hash").add_attribute(Attribute::Bold),
        ]);

    for block in blocks {
        let intact = crate::crypto::hash_block(block) == block.current_hash;
        let color = if intact { TableColor::Green } else { TableColor::Red };
        table.add_row(vec![
            Cell::new(block.id),
            Cell::new(crate::crypto::canonical_timestamp(&block.timestamp)),
            Cell::new(&block.data).fg(color),
            Cell::new(short_hash(&block.previous_hash)),
            Cell::new(short_hash(&block.current_hash)).fg(color),
        ]);
    }
    table
}

/// Human-readable block details.
pub fn describe_block(block: &Block) -> String {
    format!(
        "{} {}\n  timestamp:     {}\n  data:          {}\n  previous hash: {}\n  current hash:  {}",
        "Block".bold(),
        format!("#{}", block.id).bright_cyan().bold(),
        crate::crypto::canonical_timestamp(&block.timestamp),
        block.data,
        block.previous_hash,
        block.current_hash,
    )
}

/// Colored summary of a verification report.
pub fn describe_report(report: &VerificationReport) -> String {
    let mut out = if report.valid {
        format!(
            "{} {} blocks verified, chain intact",
            "✔".green().bold(),
            report.total_blocks
        )
    } else {
        format!(
            "{} chain compromised: {} problem(s) across {} blocks",
            "✘".red().bold(),
            report.errors.len(),
            report.total_blocks
        )
    };
    for error in &report.errors {
        out.push_str(&format!("\n  - {}", error.red()));
    }
    out
}
