use analytics::{StatisticsEngine, StatisticsReport, TradeSeries};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::TradeRecord;
use database::{DailyDebrief, Instrument};
use rust_decimal::Decimal;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn pct(value: Decimal) -> String {
    format!("{:.2}%", value)
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn trades_table(trades: &[TradeRecord]) -> Table {
    let mut table = table(vec![
        "ID", "Date", "Time", "Instrument", "Action", "Qty", "Price", "Comm.", "MAE", "MFE",
        "Bars", "Strategy", "P&L",
    ]);
    for trade in trades {
        table.add_row(vec![
            right(trade.id.to_string()),
            Cell::new(&trade.date),
            Cell::new(&trade.time),
            Cell::new(&trade.instrument),
            Cell::new(&trade.action),
            right(trade.quantity.to_string()),
            right(trade.price.to_string()),
            right(money(trade.commission)),
            right(money(trade.mae)),
            right(money(trade.mfe)),
            right(trade.bars.to_string()),
            Cell::new(&trade.entry_strategy),
            right(money(StatisticsEngine::trade_pnl(trade))),
        ]);
    }
    table
}

pub fn metrics_table(report: &StatisticsReport) -> Table {
    let rows: Vec<(&str, String)> = vec![
        ("Total trades", report.total_trades.to_string()),
        ("Winning trades", report.winning_trades.to_string()),
        ("Losing trades", report.losing_trades.to_string()),
        ("Break-even trades", report.break_even_trades.to_string()),
        ("Win rate", pct(report.win_rate_pct)),
        ("Loss rate", pct(report.loss_rate_pct)),
        ("Break-even rate", pct(report.break_even_rate_pct)),
        ("Total commission", money(report.total_commission)),
        ("Gross profit", money(report.total_profit)),
        ("Gross loss", money(report.total_loss)),
        ("Net profit", money(report.net_profit)),
        ("Largest winner", money(report.largest_winner)),
        ("Largest loser", money(report.largest_loser)),
        ("Average winner", money(report.average_winner)),
        ("Average loser", money(report.average_loser)),
        ("Average trade", money(report.average_trade_pnl)),
        ("Average daily P&L", money(report.average_daily_pnl)),
        ("Profit factor", report.profit_factor.to_string()),
        ("Max consecutive wins", report.max_consecutive_wins.to_string()),
        ("Max consecutive losses", report.max_consecutive_losses.to_string()),
        ("Max drawdown", money(report.max_drawdown)),
        ("Avg bars (winners)", money(report.average_bars_winners)),
        ("Avg bars (losers)", money(report.average_bars_losers)),
        ("Average MAE", money(report.average_mae)),
        ("Average MFE", money(report.average_mfe)),
    ];

    let mut table = table(vec!["Metric", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), right(value)]);
    }
    table
}

pub fn weekday_table(report: &StatisticsReport) -> Table {
    let mut table = table(vec!["Day", "Trades", "Win rate", "Avg P&L", "Total P&L"]);
    for (weekday, stats) in report.weekdays.iter() {
        let Some(stats) = stats else { continue };
        table.add_row(vec![
            Cell::new(weekday.to_string()),
            right(stats.trade_count.to_string()),
            right(pct(stats.win_rate_pct)),
            right(money(stats.average_pnl)),
            right(money(stats.total_pnl)),
        ]);
    }
    table
}

pub fn daily_table(report: &StatisticsReport) -> Table {
    let mut table = table(vec!["Date", "Trades", "P&L"]);
    for day in &report.daily_pnl {
        table.add_row(vec![
            Cell::new(&day.date),
            right(day.trade_count.to_string()),
            right(money(day.total_pnl)),
        ]);
    }
    table
}

pub fn series_table(series: &TradeSeries) -> Table {
    let mut table = table(vec!["#", "P&L", "Cumulative", "MFE", "MAE"]);
    for i in 0..series.len() {
        table.add_row(vec![
            right(series.trade_numbers[i].to_string()),
            right(money(series.pnl[i])),
            right(money(series.cumulative_pnl[i])),
            right(money(series.mfe[i])),
            right(money(series.mae[i])),
        ]);
    }
    table
}

pub fn instruments_table(instruments: &[Instrument]) -> Table {
    let mut table = table(vec!["Instrument", "Multiplier"]);
    for instrument in instruments {
        table.add_row(vec![
            Cell::new(&instrument.name),
            right(instrument.multiplier.normalize().to_string()),
        ]);
    }
    table
}

pub fn debrief_table(debrief: &DailyDebrief) -> Table {
    let mut table = table(vec!["Date", debrief.date.as_str()]);
    for (name, value) in [
        ("Intraday summary", &debrief.intraday_summary),
        ("Feelings", &debrief.feelings),
        ("Recurring patterns", &debrief.recurring_patterns),
        ("Best play out", &debrief.best_play_out),
        ("Leverage info", &debrief.leverage_info),
    ] {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table
}
