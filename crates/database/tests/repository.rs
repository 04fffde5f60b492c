//! Store tests against a fresh in-memory SQLite database per test.

use analytics::StatisticsEngine;
use core_types::{NewTrade, TradeFilter};
use database::{DailyDebrief, DbError, DbRepository, connect_in_memory, run_migrations};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn repository() -> DbRepository {
    let pool = connect_in_memory().await.unwrap();
    run_migrations(&pool).await.unwrap();
    DbRepository::new(pool)
}

fn trade(date: &str, time: &str, instrument: &str, action: &str, price: Decimal) -> NewTrade {
    NewTrade {
        date: date.into(),
        time: time.into(),
        instrument: instrument.into(),
        action: action.into(),
        quantity: 1,
        price,
        ..NewTrade::default()
    }
}

#[tokio::test]
async fn inserted_trade_round_trips_with_multiplier() {
    let repo = repository().await;
    repo.ensure_instrument_exists("ES", dec!(50)).await.unwrap();

    let new = NewTrade {
        commission: dec!(4.5),
        mae: dec!(-12.5),
        mfe: dec!(40),
        bars: 7,
        entry_strategy: "p-POC".into(),
        notes: "faded the open".into(),
        ..trade("2024-03-04", "09:31:00", "ES", "Buy", dec!(4500.25))
    };
    let id = repo.insert_trade(&new).await.unwrap();

    let stored = repo.get_trade(id).await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.price, dec!(4500.25));
    assert_eq!(stored.commission, dec!(4.5));
    assert_eq!(stored.mae, dec!(-12.5));
    assert_eq!(stored.bars, 7);
    assert_eq!(stored.entry_strategy, "p-POC");
    assert_eq!(stored.notes, "faded the open");
    assert_eq!(stored.multiplier, dec!(50));

    assert!(repo.get_trade(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn us_dates_are_stored_as_iso() {
    let repo = repository().await;
    let id = repo
        .insert_trade(&trade("03/04/2024", "09:31:00", "ES", "Buy", dec!(10)))
        .await
        .unwrap();

    let stored = repo.get_trade(id).await.unwrap().unwrap();
    assert_eq!(stored.date, "2024-03-04");

    let march = repo
        .get_trades(&TradeFilter::between("2024-03-01", "2024-03-31"))
        .await
        .unwrap();
    assert_eq!(march.len(), 1);
}

#[tokio::test]
async fn unknown_instruments_get_the_default_multiplier() {
    let repo = repository().await;
    repo.insert_trade(&trade("2024-03-04", "09:31:00", "MES", "Buy", dec!(10)))
        .await
        .unwrap();

    let instruments = repo.get_instruments().await.unwrap();
    assert_eq!(instruments.len(), 1);
    assert_eq!(instruments[0].name, "MES");
    assert_eq!(instruments[0].multiplier, Decimal::ONE);
}

#[tokio::test]
async fn seeding_keeps_existing_multipliers() {
    let repo = repository().await;
    repo.ensure_instrument_exists("ES", dec!(50)).await.unwrap();
    repo.update_instrument_multiplier("ES", dec!(5)).await.unwrap();

    let added = repo
        .seed_instruments([("ES", dec!(50)), ("NQ", dec!(20)), ("", dec!(1))])
        .await
        .unwrap();
    assert_eq!(added, 1);

    let instruments = repo.get_instruments().await.unwrap();
    let names: Vec<_> = instruments.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["ES", "NQ"]);
    assert_eq!(instruments[0].multiplier, dec!(5));
}

#[tokio::test]
async fn invalid_trades_are_rejected() {
    let repo = repository().await;
    let err = repo
        .insert_trade(&trade("2024-03-04", "", "ES", "Buy", dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[tokio::test]
async fn failed_import_rolls_back_every_row() {
    let repo = repository().await;
    let batch = [
        trade("2024-03-04", "09:31:00", "ES", "Buy", dec!(10)),
        trade("2024-03-04", "09:32:00", "ES", "Sell", dec!(-1)),
    ];
    assert!(repo.import_trades(&batch).await.is_err());
    assert!(repo.get_trades(&TradeFilter::new()).await.unwrap().is_empty());

    let count = repo.import_trades(&batch[..1]).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn filters_apply_and_results_are_newest_first() {
    let repo = repository().await;
    let batch = [
        NewTrade { bars: 2, entry_strategy: "p-VWAP".into(), ..trade("2024-03-01", "09:30:00", "ES", "Buy", dec!(10)) },
        NewTrade { bars: 5, ..trade("2024-03-04", "10:15:00", "NQ", "Sell", dec!(20)) },
        NewTrade { bars: 9, ..trade("2024-03-04", "14:00:00", "ES", "Sell", dec!(30)) },
        NewTrade { bars: 1, ..trade("2024-04-02", "09:45:00", "ES", "Buy", dec!(40)) },
    ];
    repo.import_trades(&batch).await.unwrap();

    let all = repo.get_trades(&TradeFilter::new()).await.unwrap();
    let order: Vec<_> = all.iter().map(|t| (t.date.as_str(), t.time.as_str())).collect();
    assert_eq!(
        order,
        [
            ("2024-04-02", "09:45:00"),
            ("2024-03-04", "14:00:00"),
            ("2024-03-04", "10:15:00"),
            ("2024-03-01", "09:30:00"),
        ]
    );

    let march = repo
        .get_trades(&TradeFilter::between("2024-03-01", "2024-03-31"))
        .await
        .unwrap();
    assert_eq!(march.len(), 3);

    let es_sells = TradeFilter {
        instrument: Some("ES".into()),
        action: Some("Sell".into()),
        ..TradeFilter::default()
    };
    let rows = repo.get_trades(&es_sells).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].price, dec!(30));

    let mid_bars_morning = TradeFilter {
        min_bars: Some(2),
        max_bars: Some(5),
        start_time: Some("09:00:00".into()),
        end_time: Some("11:00:00".into()),
        ..TradeFilter::default()
    };
    let rows = repo.get_trades(&mid_bars_morning).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|t| mid_bars_morning.matches(t)));

    let strategy = TradeFilter {
        entry_strategy: Some("p-VWAP".into()),
        ..TradeFilter::default()
    };
    assert_eq!(repo.get_trades(&strategy).await.unwrap().len(), 1);
}

#[tokio::test]
async fn statistics_follow_the_current_multiplier() {
    let repo = repository().await;
    repo.ensure_instrument_exists("ES", dec!(50)).await.unwrap();
    repo.insert_trade(&trade("2024-03-04", "09:31:00", "ES", "Buy", dec!(2)))
        .await
        .unwrap();

    let engine = StatisticsEngine::new();
    let before = engine.calculate(&repo.get_trades(&TradeFilter::new()).await.unwrap());
    assert_eq!(before.net_profit, dec!(100));

    repo.update_instrument_multiplier("ES", dec!(5)).await.unwrap();
    let after = engine.calculate(&repo.get_trades(&TradeFilter::new()).await.unwrap());
    assert_eq!(after.net_profit, dec!(10));
}

#[tokio::test]
async fn updates_on_missing_rows_are_not_found() {
    let repo = repository().await;
    assert!(matches!(
        repo.update_instrument_multiplier("ZZ", dec!(1)).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(
        repo.update_trade_entry_strategy(42, "p-POC").await,
        Err(DbError::NotFound)
    ));
}

#[tokio::test]
async fn entry_strategy_can_be_changed() {
    let repo = repository().await;
    let id = repo
        .insert_trade(&trade("2024-03-04", "09:31:00", "ES", "Buy", dec!(2)))
        .await
        .unwrap();
    repo.update_trade_entry_strategy(id, "PoorLow").await.unwrap();

    let stored = repo.get_trade(id).await.unwrap().unwrap();
    assert_eq!(stored.entry_strategy, "PoorLow");
}

#[tokio::test]
async fn images_attach_to_existing_trades_only() {
    let repo = repository().await;
    let id = repo
        .insert_trade(&trade("2024-03-04", "09:31:00", "ES", "Buy", dec!(2)))
        .await
        .unwrap();

    let paths = vec!["static/images/a.png".to_string(), "static/images/b.png".to_string()];
    repo.save_trade_images(id, &paths).await.unwrap();
    assert_eq!(repo.get_trade_images(id).await.unwrap(), paths);

    assert!(repo.save_trade_images(id + 100, &paths).await.is_err());
    assert!(repo.get_trade_images(id + 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn daily_debrief_upserts_by_date() {
    let repo = repository().await;
    assert!(repo.get_daily_debrief("2024-03-04").await.unwrap().is_none());

    let mut debrief = DailyDebrief {
        date: "2024-03-04".into(),
        intraday_summary: "choppy open".into(),
        feelings: "patient".into(),
        ..DailyDebrief::default()
    };
    repo.save_daily_debrief(&debrief).await.unwrap();

    debrief.feelings = "frustrated".into();
    debrief.best_play_out = "VAL reclaim".into();
    repo.save_daily_debrief(&debrief).await.unwrap();

    let stored = repo.get_daily_debrief("2024-03-04").await.unwrap().unwrap();
    assert_eq!(stored, debrief);
}
