//! # Garden Core
//!
//! Membership and billing backend for a community garden association.
//!
//! ## Features
//!
//! - **Member registry**: members, parcels and lease contracts
//! - **Billing**: invoices with line items and a manual cashbook
//! - **Bank statement import**: semicolon separated exports of German banks,
//!   with column aliases, European amount notation and row-level skipping
//! - **Reconciliation**: member balance from matched payments minus invoices
//! - **Member portal**: own profile, parcels, invoices, balance and the public calendar
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use garden_core::utils::MemoryStorage;
//! use garden_core::StatementImporter;
//!
//! let storage = MemoryStorage::new();
//! let importer = StatementImporter::new(storage);
//! assert_eq!(importer.config().delimiter, ';');
//! ```

pub mod bank;
pub mod config;
pub mod reconciliation;
pub mod registry;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use bank::*;
pub use config::*;
pub use reconciliation::*;
pub use registry::*;
pub use traits::*;
pub use types::*;

// Re-export invoice patterns for convenience
pub use registry::billing::patterns;
