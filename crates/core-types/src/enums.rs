use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The direction a trade record counts toward P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Classifies a free-form action string.
    ///
    /// Any action containing "buy" (case-insensitive) is a `Buy`; everything else,
    /// including unknown or empty strings, is a `Sell`.
    pub fn from_action(action: &str) -> Self {
        if action.to_lowercase().contains("buy") {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        }
    }

    /// Returns +1 for `Buy` and -1 for `Sell`.
    pub fn sign(&self) -> Decimal {
        match self {
            TradeSide::Buy => Decimal::ONE,
            TradeSide::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}
