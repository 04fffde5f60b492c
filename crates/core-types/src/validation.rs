use crate::error::CoreError;
use crate::structs::NewTrade;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// The entry strategy labels a trade can be tagged with.
pub const ENTRY_STRATEGY_OPTIONS: [&str; 8] = [
    "balance-VAH",
    "balance-VAL",
    "p-POC",
    "p-VWAP",
    "b-POC",
    "b-VWAP",
    "PoorHigh",
    "PoorLow",
];

/// Largest contract count accepted for one record.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest `quantity * price` accepted for one record, before the multiplier.
pub const MAX_NOTIONAL: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

pub fn is_entry_strategy(label: &str) -> bool {
    ENTRY_STRATEGY_OPTIONS.contains(&label)
}

/// Checks the required fields of a trade before it is stored.
///
/// All problems are collected so the caller can report them together.
pub fn validate_trade(trade: &NewTrade) -> Result<(), CoreError> {
    let mut errors = Vec::new();

    if trade.date.trim().is_empty() {
        errors.push("Date is required".to_string());
    }
    if trade.time.trim().is_empty() {
        errors.push("Time is required".to_string());
    }
    if trade.instrument.trim().is_empty() {
        errors.push("Instrument is required".to_string());
    }
    if trade.action.trim().is_empty() {
        errors.push("Action is required".to_string());
    }
    if trade.quantity <= 0 {
        errors.push("Quantity must be a positive number".to_string());
    }
    if trade.price <= Decimal::ZERO {
        errors.push("Price must be a positive number".to_string());
    }
    if trade.quantity > MAX_QUANTITY {
        errors.push(format!("Quantity must not exceed {MAX_QUANTITY}"));
    } else if trade.quantity > 0 && trade.price > Decimal::ZERO {
        let notional = Decimal::from(trade.quantity).checked_mul(trade.price);
        if notional.is_none_or(|n| n > MAX_NOTIONAL) {
            errors.push(format!("Quantity times price must not exceed {MAX_NOTIONAL}"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(errors))
    }
}

/// Normalizes a date to `YYYY-MM-DD`. `MM/DD/YYYY` is converted; anything else is returned as is.
pub fn format_date(date: &str) -> String {
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Canonical spelling for an action string at ingestion.
///
/// `buy`/`sell` in any case become `Buy`/`Sell`, position labels `Long`/`Short` map to
/// `Buy`/`Sell`. Unknown actions are kept (trimmed) and later count as sells.
pub fn normalize_action(action: &str) -> String {
    let trimmed = action.trim();
    match trimmed.to_lowercase().as_str() {
        "buy" | "long" => "Buy".to_string(),
        "sell" | "short" => "Sell".to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_trade() -> NewTrade {
        NewTrade {
            date: "2024-03-04".into(),
            time: "09:31:00".into(),
            instrument: "NQ".into(),
            action: "Buy".into(),
            quantity: 2,
            price: dec!(18000.25),
            ..NewTrade::default()
        }
    }

    #[test]
    fn valid_trade_passes() {
        assert!(validate_trade(&valid_trade()).is_ok());
    }

    #[test]
    fn every_problem_is_reported_in_order() {
        let err = validate_trade(&NewTrade::default()).unwrap_err();
        assert_eq!(
            err,
            CoreError::Validation(vec![
                "Date is required".into(),
                "Time is required".into(),
                "Instrument is required".into(),
                "Action is required".into(),
                "Quantity must be a positive number".into(),
                "Price must be a positive number".into(),
            ])
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let trade = NewTrade {
            price: dec!(-1),
            ..valid_trade()
        };
        assert!(matches!(
            validate_trade(&trade),
            Err(CoreError::Validation(errors)) if errors == vec!["Price must be a positive number".to_string()]
        ));
    }

    #[test]
    fn oversized_trades_are_rejected() {
        assert_eq!(MAX_NOTIONAL, dec!(1000000000000));

        let too_many = NewTrade {
            quantity: MAX_QUANTITY + 1,
            ..valid_trade()
        };
        assert_eq!(
            validate_trade(&too_many),
            Err(CoreError::Validation(vec![
                "Quantity must not exceed 1000000".into()
            ]))
        );

        let too_expensive = NewTrade {
            quantity: 10,
            price: dec!(100000000001),
            ..valid_trade()
        };
        assert_eq!(
            validate_trade(&too_expensive),
            Err(CoreError::Validation(vec![
                "Quantity times price must not exceed 1000000000000".into()
            ]))
        );

        let at_limit = NewTrade {
            quantity: 10,
            price: dec!(100000000000),
            ..valid_trade()
        };
        assert!(validate_trade(&at_limit).is_ok());
        assert!(validate_trade(&NewTrade { price: Decimal::MAX, ..valid_trade() }).is_err());
    }

    #[test]
    fn us_dates_become_iso() {
        assert_eq!(format_date("03/04/2024"), "2024-03-04");
        assert_eq!(format_date("2024-03-04"), "2024-03-04");
        assert_eq!(format_date("next tuesday"), "next tuesday");
    }

    #[test]
    fn actions_are_normalized() {
        assert_eq!(normalize_action(" buy "), "Buy");
        assert_eq!(normalize_action("SELL"), "Sell");
        assert_eq!(normalize_action("Long"), "Buy");
        assert_eq!(normalize_action("Short"), "Sell");
        assert_eq!(normalize_action("Flat"), "Flat");
    }

    #[test]
    fn strategy_options_are_fixed() {
        assert!(is_entry_strategy("p-VWAP"));
        assert!(!is_entry_strategy("p-vwap"));
    }
}
