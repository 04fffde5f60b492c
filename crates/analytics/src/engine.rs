use crate::report::{
    DailyPnl, ProfitFactor, StatisticsReport, TradeSeries, WeekdayBreakdown, WeekdayStats,
};
use chrono::{Datelike, NaiveDate};
use core_types::TradeRecord;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A trade paired with the P&L derived for the current calculation pass.
#[derive(Debug, Clone, Copy)]
struct PricedTrade<'a> {
    trade: &'a TradeRecord,
    pnl: Decimal,
}

impl PricedTrade<'_> {
    fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}

/// A stateless calculator turning filtered trade records into descriptive statistics.
#[derive(Debug, Default)]
pub struct StatisticsEngine {}

impl StatisticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The P&L attributed to one record:
    /// `quantity * price * multiplier * sign - commission`, where the sign comes
    /// from `TradeSide::from_action`.
    ///
    /// Arithmetic saturates at `Decimal::MAX` / `Decimal::MIN` instead of overflowing.
    pub fn trade_pnl(trade: &TradeRecord) -> Decimal {
        Decimal::from(trade.quantity)
            .saturating_mul(trade.price)
            .saturating_mul(trade.multiplier)
            .saturating_mul(trade.side().sign())
            .saturating_sub(trade.commission)
    }

    /// The main entry point for calculating statistics.
    ///
    /// # Arguments
    ///
    /// * `trades` - The already-filtered records, each carrying its instrument's multiplier.
    ///
    /// # Returns
    ///
    /// A `StatisticsReport`. An empty slice yields the all-zero report.
    pub fn calculate(&self, trades: &[TradeRecord]) -> StatisticsReport {
        let mut report = StatisticsReport::new();

        if trades.is_empty() {
            return report;
        }

        let priced = Self::price(trades);
        let chronological = Self::chronological(&priced);

        self.calculate_profitability(&priced, &mut report);
        self.calculate_streaks(&chronological, &mut report);
        self.calculate_daily(&priced, &mut report);
        self.calculate_drawdown(&chronological, &mut report);
        self.calculate_hold_times(&priced, &mut report);
        report.weekdays = self.calculate_weekdays(&priced);

        tracing::debug!(
            trades = report.total_trades,
            net_profit = %report.net_profit,
            "Calculated trade statistics."
        );

        report
    }

    /// Builds the chart sequences, ordered by (date, time).
    pub fn series(&self, trades: &[TradeRecord]) -> TradeSeries {
        let priced = Self::price(trades);
        let chronological = Self::chronological(&priced);

        let mut series = TradeSeries::default();
        let mut cumulative = Decimal::ZERO;
        for (index, entry) in chronological.iter().enumerate() {
            cumulative = cumulative.saturating_add(entry.pnl);
            series.trade_numbers.push(index + 1);
            series.pnl.push(entry.pnl);
            series.cumulative_pnl.push(cumulative);
            series.mfe.push(entry.trade.mfe);
            series.mae.push(entry.trade.mae);
        }
        series
    }

    fn price(trades: &[TradeRecord]) -> Vec<PricedTrade<'_>> {
        trades
            .iter()
            .map(|trade| PricedTrade {
                trade,
                pnl: Self::trade_pnl(trade),
            })
            .collect()
    }

    /// Stable sort on the raw date and time strings.
    fn chronological<'a>(priced: &[PricedTrade<'a>]) -> Vec<PricedTrade<'a>> {
        let mut sorted = priced.to_vec();
        sorted.sort_by(|a, b| {
            (a.trade.date.as_str(), a.trade.time.as_str())
                .cmp(&(b.trade.date.as_str(), b.trade.time.as_str()))
        });
        sorted
    }

    /// Counts, sums, rates and averages.
    fn calculate_profitability(&self, priced: &[PricedTrade], report: &mut StatisticsReport) {
        report.total_trades = priced.len();

        let mut total_mae = Decimal::ZERO;
        let mut total_mfe = Decimal::ZERO;

        for entry in priced {
            report.total_commission = report.total_commission.saturating_add(entry.trade.commission);
            total_mae = total_mae.saturating_add(entry.trade.mae);
            total_mfe = total_mfe.saturating_add(entry.trade.mfe);

            if entry.is_win() {
                report.winning_trades += 1;
                report.total_profit = report.total_profit.saturating_add(entry.pnl);
                report.largest_winner = report.largest_winner.max(entry.pnl);
            } else if entry.is_loss() {
                let loss = entry.pnl.abs();
                report.losing_trades += 1;
                report.total_loss = report.total_loss.saturating_add(loss);
                report.largest_loser = report.largest_loser.max(loss);
            } else {
                report.break_even_trades += 1;
            }
        }

        report.net_profit = report.total_profit.saturating_sub(report.total_loss);
        report.profit_factor = ProfitFactor::from_totals(report.total_profit, report.total_loss);

        let total = report.total_trades;
        report.win_rate_pct = percentage(report.winning_trades, total);
        report.loss_rate_pct = percentage(report.losing_trades, total);
        report.break_even_rate_pct = percentage(report.break_even_trades, total);

        report.average_winner = mean(report.total_profit, report.winning_trades);
        report.average_loser = mean(report.total_loss, report.losing_trades);
        report.average_trade_pnl = mean(report.net_profit, total);
        report.average_mae = mean(total_mae, total);
        report.average_mfe = mean(total_mfe, total);
    }

    /// Longest runs of consecutive winners and losers.
    ///
    /// The running counter starts at 1 and the maxima are only updated from the
    /// second record onward, so the first record never scores on its own: a single
    /// winner reports a streak of 0, three straight winners report 2.
    fn calculate_streaks(&self, chronological: &[PricedTrade], report: &mut StatisticsReport) {
        let mut current_streak = 1;
        let mut max_win_streak = 0;
        let mut max_loss_streak = 0;

        for pair in chronological.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            let continues = (current.is_win() && previous.is_win())
                || (current.is_loss() && previous.is_loss());
            if continues {
                current_streak += 1;
            } else {
                current_streak = 1;
            }

            if current.is_win() {
                max_win_streak = max_win_streak.max(current_streak);
            } else if current.is_loss() {
                max_loss_streak = max_loss_streak.max(current_streak);
            }
        }

        report.max_consecutive_wins = max_win_streak;
        report.max_consecutive_losses = max_loss_streak;
    }

    /// Groups P&L by calendar date and averages the daily totals.
    fn calculate_daily(&self, priced: &[PricedTrade], report: &mut StatisticsReport) {
        let mut by_date: BTreeMap<&str, (usize, Decimal)> = BTreeMap::new();
        for entry in priced {
            let day = by_date.entry(entry.trade.date.as_str()).or_default();
            day.0 += 1;
            day.1 = day.1.saturating_add(entry.pnl);
        }

        report.daily_pnl = by_date
            .into_iter()
            .map(|(date, (trade_count, total_pnl))| DailyPnl {
                date: date.to_string(),
                trade_count,
                total_pnl,
            })
            .collect();

        let sum = saturating_sum(report.daily_pnl.iter().map(|d| d.total_pnl));
        report.average_daily_pnl = mean(sum, report.daily_pnl.len());
    }

    /// Largest peak-to-trough drop of the cumulative P&L curve, which starts at 0.
    fn calculate_drawdown(&self, chronological: &[PricedTrade], report: &mut StatisticsReport) {
        let mut cumulative = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;

        for entry in chronological {
            cumulative = cumulative.saturating_add(entry.pnl);
            if cumulative > peak {
                peak = cumulative;
            }
            let drawdown = peak.saturating_sub(cumulative);
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        report.max_drawdown = max_drawdown;
    }

    /// Average bars held by winners and by losers. Denominators floor at 1.
    fn calculate_hold_times(&self, priced: &[PricedTrade], report: &mut StatisticsReport) {
        let mut winner_bars = Decimal::ZERO;
        let mut loser_bars = Decimal::ZERO;
        for entry in priced {
            if entry.is_win() {
                winner_bars = winner_bars.saturating_add(Decimal::from(entry.trade.bars));
            } else if entry.is_loss() {
                loser_bars = loser_bars.saturating_add(Decimal::from(entry.trade.bars));
            }
        }

        report.average_bars_winners = winner_bars / Decimal::from(report.winning_trades.max(1));
        report.average_bars_losers = loser_bars / Decimal::from(report.losing_trades.max(1));
    }

    /// Per-weekday win rate and P&L, Monday to Friday.
    ///
    /// Weekend trades and trades whose date does not parse as `YYYY-MM-DD` are left
    /// out of this table only; they still count everywhere else.
    fn calculate_weekdays(&self, priced: &[PricedTrade]) -> WeekdayBreakdown {
        let mut buckets: [Vec<Decimal>; 5] = Default::default();

        for entry in priced {
            let Ok(date) = NaiveDate::parse_from_str(&entry.trade.date, "%Y-%m-%d") else {
                tracing::trace!(
                    id = entry.trade.id,
                    date = %entry.trade.date,
                    "Skipping unparseable date in weekday breakdown."
                );
                continue;
            };
            let index = date.weekday().num_days_from_monday() as usize;
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.push(entry.pnl);
            }
        }

        let mut breakdown = WeekdayBreakdown::default();
        for ((slot, weekday), pnls) in breakdown
            .slots
            .iter_mut()
            .zip(WeekdayBreakdown::WEEKDAYS)
            .zip(buckets)
        {
            if pnls.is_empty() {
                continue;
            }
            let trade_count = pnls.len();
            let winning_trades = pnls.iter().filter(|pnl| **pnl > Decimal::ZERO).count();
            let total_pnl = saturating_sum(pnls.iter().copied());

            *slot = Some(WeekdayStats {
                weekday,
                trade_count,
                winning_trades,
                win_rate_pct: percentage(winning_trades, trade_count),
                average_pnl: mean(total_pnl, trade_count),
                total_pnl,
            });
        }
        breakdown
    }
}

/// `count / total * 100`, or 0 when `total` is 0.
fn percentage(count: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(count) / Decimal::from(total) * Decimal::ONE_HUNDRED
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `sum / count`, or 0 when `count` is 0.
fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    sum / Decimal::from(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rust_decimal_macros::dec;

    fn buy(id: i64, date: &str, time: &str, price: Decimal) -> TradeRecord {
        TradeRecord::new(id, date, time, "TEST", "Buy", 1, price, dec!(1))
    }

    fn sell(id: i64, date: &str, time: &str, price: Decimal) -> TradeRecord {
        TradeRecord::new(id, date, time, "TEST", "Sell", 1, price, dec!(1))
    }

    #[test]
    fn empty_input_yields_zero_report() {
        let report = StatisticsEngine::new().calculate(&[]);
        assert_eq!(report, StatisticsReport::new());
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.win_rate_pct, Decimal::ZERO);
        assert_eq!(report.profit_factor, ProfitFactor::Finite(Decimal::ZERO));
    }

    #[test]
    fn pnl_uses_quantity_price_multiplier_and_commission() {
        let trade = TradeRecord::new(1, "2024-03-04", "09:30:00", "ES", "buy", 2, dec!(10.5), dec!(50))
            .with_commission(dec!(4.5));
        assert_eq!(StatisticsEngine::trade_pnl(&trade), dec!(1045.5));

        let short = TradeRecord::new(2, "2024-03-04", "09:30:00", "ES", "Short", 2, dec!(10.5), dec!(50))
            .with_commission(dec!(4.5));
        assert_eq!(StatisticsEngine::trade_pnl(&short), dec!(-1054.5));
    }

    #[test]
    fn single_buy_record() {
        let report = StatisticsEngine::new().calculate(&[buy(1, "2024-03-04", "09:30:00", dec!(100))]);

        assert_eq!(report.total_trades, 1);
        assert_eq!(report.winning_trades, 1);
        assert_eq!(report.net_profit, dec!(100));
        assert_eq!(report.average_winner, dec!(100));
        assert_eq!(report.largest_winner, dec!(100));
        assert_eq!(report.win_rate_pct, dec!(100));
        assert!(report.profit_factor.is_infinite());
        // The first record never scores a streak on its own.
        assert_eq!(report.max_consecutive_wins, 0);
    }

    #[test]
    fn same_day_win_and_loss() {
        let win = buy(1, "2024-03-05", "09:30:00", dec!(50));
        let loss = sell(2, "2024-03-05", "10:30:00", dec!(30));
        let report = StatisticsEngine::new().calculate(&[win, loss]);

        assert_eq!(report.daily_pnl.len(), 1);
        assert_eq!(report.daily_pnl[0].total_pnl, dec!(20));
        assert_eq!(report.average_daily_pnl, dec!(20));
        assert_eq!(report.break_even_rate_pct, Decimal::ZERO);
        assert_eq!(report.win_rate_pct, dec!(50));
        assert_eq!(report.loss_rate_pct, dec!(50));
        assert_eq!(report.profit_factor.finite(), Some(dec!(50) / dec!(30)));
        assert_eq!(report.largest_winner, dec!(50));
        assert_eq!(report.largest_loser, dec!(30));
        assert_eq!(report.average_winner, dec!(50));
        assert_eq!(report.average_loser, dec!(30));
        assert_eq!(report.average_trade_pnl, dec!(10));
    }

    #[test]
    fn loser_metrics_use_absolute_losses() {
        let trades = [
            sell(1, "2024-03-04", "09:00:00", dec!(20)).with_bars(3),
            sell(2, "2024-03-04", "09:10:00", dec!(60)).with_bars(9),
            buy(3, "2024-03-04", "09:20:00", dec!(10)).with_bars(2),
        ];
        let report = StatisticsEngine::new().calculate(&trades);

        assert_eq!(report.losing_trades, 2);
        assert_eq!(report.total_loss, dec!(80));
        assert_eq!(report.largest_loser, dec!(60));
        assert_eq!(report.average_loser, dec!(40));
        assert_eq!(report.average_trade_pnl, dec!(-70) / dec!(3));
        assert_eq!(report.average_bars_losers, dec!(6));
        assert_eq!(report.average_bars_winners, dec!(2));
        assert_eq!(report.max_consecutive_losses, 2);
    }

    #[test]
    fn oversized_values_saturate_instead_of_panicking() {
        let huge = TradeRecord::new(
            1,
            "2024-03-04",
            "09:00:00",
            "6J",
            "Buy",
            u32::MAX,
            dec!(1000000000000000),
            dec!(12500000),
        );
        let report = StatisticsEngine::new().calculate(std::slice::from_ref(&huge));
        assert_eq!(StatisticsEngine::trade_pnl(&huge), Decimal::MAX);
        assert_eq!(report.net_profit, Decimal::MAX);

        let at_max = [
            buy(1, "2024-03-04", "09:00:00", Decimal::MAX),
            buy(2, "2024-03-04", "09:10:00", Decimal::MAX),
        ];
        let report = StatisticsEngine::new().calculate(&at_max);
        assert_eq!(report.total_profit, Decimal::MAX);
        assert_eq!(report.average_daily_pnl, Decimal::MAX);
        assert_eq!(StatisticsEngine::new().series(&at_max).cumulative_pnl[1], Decimal::MAX);

        let short = TradeRecord::new(3, "2024-03-04", "09:20:00", "6J", "Sell", 1, Decimal::MAX, dec!(2));
        let report = StatisticsEngine::new().calculate(&[short]);
        assert_eq!(report.total_loss, Decimal::MAX);
        assert_eq!(report.max_drawdown, Decimal::MAX);
    }

    #[test]
    fn three_straight_winners_score_a_streak_of_two() {
        // Supplied out of order; the streak walk sorts by (date, time).
        let trades = [
            buy(3, "2024-03-04", "11:00:00", dec!(10)),
            buy(1, "2024-03-04", "09:00:00", dec!(10)),
            buy(2, "2024-03-04", "10:00:00", dec!(10)),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.max_consecutive_wins, 2);
        assert_eq!(report.max_consecutive_losses, 0);
    }

    #[test]
    fn break_even_resets_the_streak() {
        let trades = [
            sell(1, "2024-03-04", "09:00:00", dec!(10)),
            sell(2, "2024-03-04", "09:10:00", dec!(10)),
            sell(3, "2024-03-04", "09:20:00", dec!(10)),
            buy(4, "2024-03-04", "09:30:00", dec!(10)).with_commission(dec!(10)),
            sell(5, "2024-03-04", "09:40:00", dec!(10)),
            sell(6, "2024-03-04", "09:50:00", dec!(10)),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.break_even_trades, 1);
        assert_eq!(report.max_consecutive_losses, 3);
    }

    #[test]
    fn drawdown_follows_running_peak() {
        // Cumulative curve: 0, 100, 60, 150
        let trades = [
            buy(1, "2024-03-04", "09:00:00", dec!(100)),
            sell(2, "2024-03-04", "10:00:00", dec!(40)),
            buy(3, "2024-03-04", "11:00:00", dec!(90)),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.max_drawdown, dec!(40));
    }

    #[test]
    fn drawdown_counts_from_zero_origin() {
        let trades = [sell(1, "2024-03-04", "09:00:00", dec!(25))];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.max_drawdown, dec!(25));
    }

    #[test]
    fn hold_time_averages_floor_the_denominator() {
        let trades = [
            buy(1, "2024-03-04", "09:00:00", dec!(10)).with_bars(4),
            buy(2, "2024-03-04", "09:10:00", dec!(10)).with_bars(6),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.average_bars_winners, dec!(5));
        assert_eq!(report.average_bars_losers, Decimal::ZERO);
    }

    #[test]
    fn excursions_average_over_all_trades() {
        let trades = [
            buy(1, "2024-03-04", "09:00:00", dec!(10)).with_excursions(dec!(-20), dec!(30)),
            sell(2, "2024-03-04", "09:10:00", dec!(10)).with_excursions(dec!(-40), dec!(0)),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.average_mae, dec!(-30));
        assert_eq!(report.average_mfe, dec!(15));
    }

    #[test]
    fn total_commission_sums_every_record() {
        let trades = [
            buy(1, "2024-03-04", "09:00:00", dec!(10)).with_commission(dec!(2.25)),
            sell(2, "2024-03-04", "09:10:00", dec!(10)).with_commission(dec!(2.25)),
        ];
        let report = StatisticsEngine::new().calculate(&trades);
        assert_eq!(report.total_commission, dec!(4.50));
    }

    #[test]
    fn weekend_and_malformed_dates_skip_weekday_table_only() {
        let trades = [
            buy(1, "2024-03-04", "09:00:00", dec!(10)), // Monday
            sell(2, "2024-03-04", "10:00:00", dec!(4)), // Monday
            buy(3, "2024-03-08", "09:00:00", dec!(7)),  // Friday
            buy(4, "2024-03-09", "09:00:00", dec!(500)), // Saturday
            buy(5, "03/05/2024", "09:00:00", dec!(1000)), // not ISO
        ];
        let report = StatisticsEngine::new().calculate(&trades);

        assert_eq!(report.total_trades, 5);
        assert_eq!(report.net_profit, dec!(1513));

        let monday = report.weekdays.get(Weekday::Mon).unwrap();
        assert_eq!(monday.trade_count, 2);
        assert_eq!(monday.win_rate_pct, dec!(50));
        assert_eq!(monday.total_pnl, dec!(6));
        assert_eq!(monday.average_pnl, dec!(3));

        let friday = report.weekdays.get(Weekday::Fri).unwrap();
        assert_eq!(friday.total_pnl, dec!(7));

        assert!(report.weekdays.get(Weekday::Tue).is_none());
        let weekday_total: Decimal = report
            .weekdays
            .iter()
            .filter_map(|(_, stats)| stats.map(|s| s.total_pnl))
            .sum();
        assert_eq!(weekday_total, dec!(13));
    }

    #[test]
    fn series_is_chronological_and_cumulative() {
        let trades = [
            sell(2, "2024-03-05", "09:00:00", dec!(40)).with_excursions(dec!(-45), dec!(5)),
            buy(1, "2024-03-04", "09:00:00", dec!(100)).with_excursions(dec!(-10), dec!(120)),
        ];
        let series = StatisticsEngine::new().series(&trades);

        assert_eq!(series.trade_numbers, vec![1, 2]);
        assert_eq!(series.pnl, vec![dec!(100), dec!(-40)]);
        assert_eq!(series.cumulative_pnl, vec![dec!(100), dec!(60)]);
        assert_eq!(series.mfe, vec![dec!(120), dec!(5)]);
        assert_eq!(series.mae, vec![dec!(-10), dec!(-45)]);
    }

    #[test]
    fn recalculation_uses_the_multiplier_on_the_record() {
        let trade = buy(1, "2024-03-04", "09:00:00", dec!(10));
        let engine = StatisticsEngine::new();
        assert_eq!(engine.calculate(std::slice::from_ref(&trade)).net_profit, dec!(10));

        let repriced = TradeRecord {
            multiplier: dec!(50),
            ..trade
        };
        assert_eq!(engine.calculate(&[repriced]).net_profit, dec!(500));
    }
}
