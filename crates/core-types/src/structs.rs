use crate::enums::TradeSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single recorded trade leg, as supplied by the record store.
///
/// `multiplier` is the instrument's multiplier at query time, not at entry time,
/// so editing an instrument changes every historical record that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: i64,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// ISO time of day, `HH:MM:SS`.
    pub time: String,
    pub instrument: String,
    pub action: String,
    pub quantity: u32,
    pub price: Decimal,
    pub commission: Decimal,
    pub mae: Decimal,
    pub mfe: Decimal,
    pub bars: u32,
    pub entry_strategy: String,
    pub notes: String,
    pub multiplier: Decimal,
}

impl TradeRecord {
    /// Creates a record with the required fields; every optional field starts at zero or empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        date: impl Into<String>,
        time: impl Into<String>,
        instrument: impl Into<String>,
        action: impl Into<String>,
        quantity: u32,
        price: Decimal,
        multiplier: Decimal,
    ) -> Self {
        Self {
            id,
            date: date.into(),
            time: time.into(),
            instrument: instrument.into(),
            action: action.into(),
            quantity,
            price,
            commission: Decimal::ZERO,
            mae: Decimal::ZERO,
            mfe: Decimal::ZERO,
            bars: 0,
            entry_strategy: String::new(),
            notes: String::new(),
            multiplier,
        }
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_excursions(mut self, mae: Decimal, mfe: Decimal) -> Self {
        self.mae = mae;
        self.mfe = mfe;
        self
    }

    pub fn with_bars(mut self, bars: u32) -> Self {
        self.bars = bars;
        self
    }

    pub fn side(&self) -> TradeSide {
        TradeSide::from_action(&self.action)
    }
}

/// A trade about to be written to the store. It has no id and no multiplier yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewTrade {
    pub date: String,
    pub time: String,
    pub instrument: String,
    pub action: String,
    pub quantity: i64,
    pub price: Decimal,
    pub commission: Decimal,
    pub mae: Decimal,
    pub mfe: Decimal,
    pub bars: i64,
    pub entry_strategy: String,
    pub notes: String,
}

/// The predicate a caller applies when asking the store for records.
///
/// Every bound is inclusive and compared lexically, so dates and times must be in ISO form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub instrument: Option<String>,
    pub action: Option<String>,
    pub entry_strategy: Option<String>,
    pub min_bars: Option<u32>,
    pub max_bars: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TradeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluates the filter against an in-memory record, mirroring the store's SQL.
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        fn at_least(value: &str, bound: &Option<String>) -> bool {
            bound.as_deref().is_none_or(|b| value >= b)
        }
        fn at_most(value: &str, bound: &Option<String>) -> bool {
            bound.as_deref().is_none_or(|b| value <= b)
        }
        fn equals(value: &str, wanted: &Option<String>) -> bool {
            wanted.as_deref().is_none_or(|w| value == w)
        }

        at_least(&trade.date, &self.start_date)
            && at_most(&trade.date, &self.end_date)
            && equals(&trade.instrument, &self.instrument)
            && equals(&trade.action, &self.action)
            && equals(&trade.entry_strategy, &self.entry_strategy)
            && self.min_bars.is_none_or(|min| trade.bars >= min)
            && self.max_bars.is_none_or(|max| trade.bars <= max)
            && at_least(&trade.time, &self.start_time)
            && at_most(&trade.time, &self.end_time)
    }
}
