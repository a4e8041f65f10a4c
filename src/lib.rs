//! # Wordmill - Parallel Text Analytics for Tabular Records
//!
//! Wordmill ingests a CSV of records, runs a CPU-heavy text analysis of each
//! record's free-text field on a fixed-size worker pool, and acknowledges
//! every record through an asynchronous notifier once its analysis is done.
//!
//! ## Features
//!
//! - **True parallelism**: analysis runs on dedicated OS threads, not on the
//!   async scheduler
//! - **Bounded fan-out**: at most `workers` analyses execute at any moment,
//!   clamped to host CPU capacity
//! - **Collect-all fan-in**: every record reaches a terminal outcome, even
//!   when siblings fail
//! - **Per-stage timeouts**: a hung analysis or acknowledgment cannot stall
//!   the batch
//!
//! ## Quick Start
//!
//! ```bash
//! # Install wordmill
//! cargo install wordmill
//!
//! # Analyze a CSV with 4 workers
//! wordmill process records.csv --workers 4
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod notify;
pub mod pipeline;
pub mod pool;
pub mod source;

pub use cli::Cli;
pub use config::WordmillConfig;

/// Result type alias for Wordmill operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
