//! HashLedger - an append-only, hash-chained ledger with tamper detection
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`crypto`] - Block digest computation (SHA-256 over canonical fields)
//! - [`blockchain`] - Block model, chain management and integrity verification
//! - [`ledger`] - Thread-safe ledger store (reader/writer lock)
//!
//! ## State Management
//! - [`persistence`] - Storage backends (SQLite, in-memory)
//!
//! ## Integration
//! - [`api`] - REST gateway (axum)
//! - [`node`] - Startup orchestration and lifecycle state
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup
//! - [`cli`] - CLI definitions and rendering

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod crypto;
pub mod ledger;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
