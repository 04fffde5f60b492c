use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gross profit divided by gross loss.
///
/// With no losses and some profit the ratio has no finite value, so callers
/// must handle `Infinite` explicitly when displaying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfitFactor {
    Finite(Decimal),
    Infinite,
}

impl ProfitFactor {
    pub fn from_totals(total_profit: Decimal, total_loss: Decimal) -> Self {
        if total_loss > Decimal::ZERO {
            // A quotient beyond `Decimal::MAX` is reported as infinite.
            total_profit
                .checked_div(total_loss)
                .map_or(ProfitFactor::Infinite, ProfitFactor::Finite)
        } else if total_profit > Decimal::ZERO {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(Decimal::ZERO)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            ProfitFactor::Finite(value) => Some(*value),
            ProfitFactor::Infinite => None,
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(Decimal::ZERO)
    }
}

impl fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfitFactor::Finite(value) => write!(f, "{:.2}", value),
            ProfitFactor::Infinite => write!(f, "∞"),
        }
    }
}

/// Net P&L of all trades sharing one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: String,
    pub trade_count: usize,
    pub total_pnl: Decimal,
}

/// Win rate and P&L for the trades that fall on one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub win_rate_pct: Decimal,
    pub average_pnl: Decimal,
    pub total_pnl: Decimal,
}

/// Monday through Friday, in that order. A slot is `None` when no trade fell on that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBreakdown {
    pub slots: [Option<WeekdayStats>; 5],
}

impl WeekdayBreakdown {
    pub const WEEKDAYS: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Returns the stats for a weekday; always `None` for Saturday and Sunday.
    pub fn get(&self, weekday: Weekday) -> Option<&WeekdayStats> {
        let index = weekday.num_days_from_monday() as usize;
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, Option<&WeekdayStats>)> {
        Self::WEEKDAYS
            .iter()
            .copied()
            .zip(self.slots.iter().map(Option::as_ref))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Per-trade sequences for charting, all aligned by ascending (date, time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSeries {
    /// 1-based trade index.
    pub trade_numbers: Vec<usize>,
    pub pnl: Vec<Decimal>,
    pub cumulative_pnl: Vec<Decimal>,
    pub mfe: Vec<Decimal>,
    pub mae: Vec<Decimal>,
}

impl TradeSeries {
    pub fn len(&self) -> usize {
        self.trade_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trade_numbers.is_empty()
    }
}

/// The descriptive statistics for one filtered set of trades.
///
/// This struct is the output of the `StatisticsEngine` and is handed as-is to the
/// presentation layer (text tables or JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    // I. Counts and rates
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub break_even_trades: usize,
    pub win_rate_pct: Decimal,
    pub loss_rate_pct: Decimal,
    pub break_even_rate_pct: Decimal,

    // II. Profitability
    pub total_commission: Decimal,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub net_profit: Decimal,
    pub largest_winner: Decimal,
    pub largest_loser: Decimal,
    pub average_winner: Decimal,
    pub average_loser: Decimal,
    pub average_trade_pnl: Decimal,
    pub average_daily_pnl: Decimal,
    pub profit_factor: ProfitFactor,

    // III. Sequencing and risk
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub max_drawdown: Decimal,

    // IV. Hold-time proxies and excursions
    pub average_bars_winners: Decimal,
    pub average_bars_losers: Decimal,
    pub average_mae: Decimal,
    pub average_mfe: Decimal,

    // V. Breakdowns
    pub daily_pnl: Vec<DailyPnl>,
    pub weekdays: WeekdayBreakdown,
}

impl StatisticsReport {
    /// Creates the all-zero report returned for an empty trade list.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            break_even_trades: 0,
            win_rate_pct: Decimal::ZERO,
            loss_rate_pct: Decimal::ZERO,
            break_even_rate_pct: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            total_loss: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            largest_winner: Decimal::ZERO,
            largest_loser: Decimal::ZERO,
            average_winner: Decimal::ZERO,
            average_loser: Decimal::ZERO,
            average_trade_pnl: Decimal::ZERO,
            average_daily_pnl: Decimal::ZERO,
            profit_factor: ProfitFactor::default(),
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            max_drawdown: Decimal::ZERO,
            average_bars_winners: Decimal::ZERO,
            average_bars_losers: Decimal::ZERO,
            average_mae: Decimal::ZERO,
            average_mfe: Decimal::ZERO,
            daily_pnl: Vec::new(),
            weekdays: WeekdayBreakdown::default(),
        }
    }
}

impl Default for StatisticsReport {
    fn default() -> Self {
        Self::new()
    }
}
