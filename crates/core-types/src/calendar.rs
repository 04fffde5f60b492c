use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// A source of "now", injected so trading-date logic never reads the wall clock directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Decides which calendar date a journal entry belongs to.
///
/// A new trading day begins at `rollover_hour` local time. Before that hour the
/// previous day is still current, as long as the previous day was a weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingCalendar {
    rollover_hour: u32,
}

impl TradingCalendar {
    pub const DEFAULT_ROLLOVER_HOUR: u32 = 15;

    /// Hours past 23 are clamped to 23.
    pub fn new(rollover_hour: u32) -> Self {
        Self {
            rollover_hour: rollover_hour.min(23),
        }
    }

    pub fn rollover_hour(&self) -> u32 {
        self.rollover_hour
    }

    pub fn current_trading_date(&self, clock: &dyn Clock) -> NaiveDate {
        let now = clock.now();
        let today = now.date();

        if now.time() < self.rollover_time() {
            let yesterday = today - Duration::days(1);
            if is_trading_day(yesterday) {
                return yesterday;
            }
        }
        today
    }

    /// Today's date at the rollover hour.
    pub fn session_start(&self, clock: &dyn Clock) -> NaiveDateTime {
        clock.now().date().and_time(self.rollover_time())
    }

    fn rollover_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.rollover_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROLLOVER_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, hour: u32) -> FixedClock {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        FixedClock(date.and_hms_opt(hour, 30, 0).unwrap())
    }

    #[test]
    fn weekdays_are_trading_days() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert!(is_trading_day(monday));
        assert!(!is_trading_day(saturday));
    }

    #[test]
    fn after_rollover_uses_today() {
        let calendar = TradingCalendar::default();
        // Wednesday 16:30
        let date = calendar.current_trading_date(&at("2024-03-06", 16));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn before_rollover_uses_previous_weekday() {
        let calendar = TradingCalendar::default();
        // Wednesday 09:30 belongs to Tuesday's session
        let date = calendar.current_trading_date(&at("2024-03-06", 9));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn monday_morning_stays_on_monday() {
        let calendar = TradingCalendar::default();
        // Sunday is not a trading day, so Monday morning is Monday.
        let date = calendar.current_trading_date(&at("2024-03-04", 9));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn session_start_is_rollover_hour_today() {
        let calendar = TradingCalendar::new(17);
        let start = calendar.session_start(&at("2024-03-06", 9));
        assert_eq!(start.to_string(), "2024-03-06 17:00:00");
    }

    #[test]
    fn rollover_hour_is_clamped() {
        assert_eq!(TradingCalendar::new(40).rollover_hour(), 23);
    }
}
