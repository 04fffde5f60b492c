//! # Journal Analytics Engine
//!
//! This crate turns a filtered list of trade records into descriptive trading
//! statistics: win/loss counts and rates, profit factor, streaks, drawdown,
//! hold-time proxies, and per-day and per-weekday breakdowns.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the record
//!   store or the presentation layer. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `StatisticsEngine` takes records as input and
//!   produces a `StatisticsReport` as output. P&L is derived fresh on every call and
//!   nothing is cached between calls.
//!
//! ## Public API
//!
//! - `StatisticsEngine`: The main struct that contains the calculation logic.
//! - `StatisticsReport`: The struct that holds every metric plus the breakdowns.
//! - `TradeSeries`: Chart-ready per-trade sequences in chronological order.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::StatisticsEngine;
pub use report::{
    DailyPnl, ProfitFactor, StatisticsReport, TradeSeries, WeekdayBreakdown, WeekdayStats,
};
