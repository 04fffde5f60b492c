//! # Journal Core Types
//!
//! The shared vocabulary of the trading journal: trade records, the sign rule for
//! actions, store filters, input validation and the trading-day calendar.
//! This crate has no knowledge of storage or presentation.

pub mod calendar;
pub mod enums;
pub mod error;
pub mod structs;
pub mod validation;

// Re-export the core types to provide a clean public API.
pub use calendar::{Clock, FixedClock, SystemClock, TradingCalendar, is_trading_day};
pub use enums::TradeSide;
pub use error::CoreError;
pub use structs::{NewTrade, TradeFilter, TradeRecord};
pub use validation::{
    ENTRY_STRATEGY_OPTIONS, MAX_NOTIONAL, MAX_QUANTITY, format_date, is_entry_strategy,
    normalize_action, validate_trade,
};
