//! # Journal Database Crate
//!
//! This crate is the trade record store: a high-level, application-specific interface
//! to the journal's SQLite file.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific logic and hides
//!   the SQL from the rest of the application.
//! - **Query-time multipliers:** Trades are always joined with the instrument's current
//!   multiplier, so editing a multiplier reprices the whole history.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a `SqlitePool`.
//!
//! ## Public API
//!
//! - `connect` / `connect_in_memory`: Establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `DbRepository`: Holds the pool and provides all data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_in_memory, run_migrations};
pub use error::DbError;
pub use repository::{DEFAULT_MULTIPLIER, DailyDebrief, DbRepository, DbTrade, Instrument};
