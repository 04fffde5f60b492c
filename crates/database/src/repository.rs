use crate::DbError;
use core_types::{NewTrade, TradeFilter, TradeRecord, format_date, validate_trade};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::{FromRow, QueryBuilder, Row};

/// Multiplier given to instruments that first appear through a trade or an import.
pub const DEFAULT_MULTIPLIER: Decimal = Decimal::ONE;

const TRADE_COLUMNS: &str = "t.id AS id, t.date AS date, t.time AS time, \
     t.instrument AS instrument, t.action AS action, t.quantity AS quantity, t.price AS price, \
     t.commission AS commission, t.mae AS mae, t.mfe AS mfe, t.bars AS bars, \
     t.entry_strategy AS entry_strategy, t.notes AS notes, i.multiplier AS multiplier";

/// The `DbRepository` provides a high-level, application-specific interface
/// to the journal database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

/// A row from the `instruments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub multiplier: Decimal,
}

/// The end-of-day notes kept for one trading date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyDebrief {
    pub date: String,
    pub intraday_summary: String,
    pub feelings: String,
    pub recurring_patterns: String,
    pub best_play_out: String,
    pub leverage_info: String,
}

/// Database-specific trade struct that matches the joined trades/instruments schema.
#[derive(Debug, Clone, FromRow)]
pub struct DbTrade {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub instrument: String,
    pub action: String,
    pub quantity: i64,
    pub price: f64,
    pub commission: Option<f64>,
    pub mae: Option<f64>,
    pub mfe: Option<f64>,
    pub bars: Option<i64>,
    pub entry_strategy: Option<String>,
    pub notes: Option<String>,
    pub multiplier: f64,
}

impl TryFrom<DbTrade> for TradeRecord {
    type Error = DbError;

    fn try_from(row: DbTrade) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            DbError::InvalidRow(format!("trade {} has quantity {}", row.id, row.quantity))
        })?;
        let bars = u32::try_from(row.bars.unwrap_or(0))
            .map_err(|_| DbError::InvalidRow(format!("trade {} has negative bars", row.id)))?;

        Ok(TradeRecord {
            id: row.id,
            date: row.date,
            time: row.time,
            instrument: row.instrument,
            action: row.action,
            quantity,
            price: from_real(row.price)?,
            commission: from_real(row.commission.unwrap_or(0.0))?,
            mae: from_real(row.mae.unwrap_or(0.0))?,
            mfe: from_real(row.mfe.unwrap_or(0.0))?,
            bars,
            entry_strategy: row.entry_strategy.unwrap_or_default(),
            notes: row.notes.unwrap_or_default(),
            multiplier: from_real(row.multiplier)?,
        })
    }
}

fn from_real(value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .ok_or_else(|| DbError::InvalidRow(format!("{value} is not a finite number")))
}

fn to_real(value: Decimal) -> Result<f64, DbError> {
    value
        .to_f64()
        .ok_or_else(|| DbError::InvalidRow(format!("{value} cannot be stored as REAL")))
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==========================================================================
    // Instruments
    // ==========================================================================

    /// Inserts the instrument with `default_multiplier` unless it is already known.
    /// An empty name is ignored.
    pub async fn ensure_instrument_exists(
        &self,
        name: &str,
        default_multiplier: Decimal,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        ensure_instrument(&mut *conn, name, default_multiplier).await.map(|_| ())
    }

    /// Registers every instrument that is not stored yet. Existing multipliers are kept.
    pub async fn seed_instruments<'a, I>(&self, instruments: I) -> Result<usize, DbError>
    where
        I: IntoIterator<Item = (&'a str, Decimal)>,
    {
        let mut tx = self.pool.begin().await?;
        let mut added = 0;
        for (name, multiplier) in instruments {
            if ensure_instrument(&mut *tx, name, multiplier).await? {
                added += 1;
            }
        }
        tx.commit().await?;
        Ok(added)
    }

    pub async fn get_instruments(&self) -> Result<Vec<Instrument>, DbError> {
        let rows = sqlx::query("SELECT name, multiplier FROM instruments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Instrument, DbError> {
                Ok(Instrument {
                    name: row.try_get("name")?,
                    multiplier: from_real(row.try_get("multiplier")?)?,
                })
            })
            .collect()
    }

    /// Changes an instrument's multiplier. Every stored trade on that instrument is
    /// priced with the new value from then on.
    pub async fn update_instrument_multiplier(
        &self,
        name: &str,
        multiplier: Decimal,
    ) -> Result<(), DbError> {
        if multiplier < Decimal::ZERO {
            return Err(DbError::InvalidRow(format!(
                "multiplier for {name} must not be negative"
            )));
        }
        let result = sqlx::query("UPDATE instruments SET multiplier = ? WHERE name = ?")
            .bind(to_real(multiplier)?)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        tracing::info!(instrument = name, %multiplier, "Updated instrument multiplier.");
        Ok(())
    }

    // ==========================================================================
    // Trades
    // ==========================================================================

    /// Validates and stores one trade, registering its instrument if needed.
    pub async fn insert_trade(&self, trade: &NewTrade) -> Result<i64, DbError> {
        let mut conn = self.pool.acquire().await?;
        insert_trade(&mut *conn, trade).await
    }

    /// Stores a batch of trades atomically: either every row is written or none is.
    pub async fn import_trades(&self, trades: &[NewTrade]) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;
        for trade in trades {
            // Dropping the transaction on error rolls it back.
            insert_trade(&mut *tx, trade).await?;
        }
        tx.commit().await?;

        tracing::info!(count = trades.len(), "Imported trades.");
        Ok(trades.len())
    }

    /// Fetches the trades matching `filter`, newest first, each carrying its
    /// instrument's current multiplier.
    pub async fn get_trades(&self, filter: &TradeFilter) -> Result<Vec<TradeRecord>, DbError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {TRADE_COLUMNS} FROM trades t JOIN instruments i ON t.instrument = i.name"
        ));

        let mut has_condition = false;
        let mut next_condition = |query: &mut QueryBuilder<'_, Sqlite>| {
            query.push(if has_condition { " AND " } else { " WHERE " });
            has_condition = true;
        };

        if let Some(start_date) = &filter.start_date {
            next_condition(&mut query);
            query.push("t.date >= ").push_bind(start_date.clone());
        }
        if let Some(end_date) = &filter.end_date {
            next_condition(&mut query);
            query.push("t.date <= ").push_bind(end_date.clone());
        }
        if let Some(instrument) = &filter.instrument {
            next_condition(&mut query);
            query.push("t.instrument = ").push_bind(instrument.clone());
        }
        if let Some(action) = &filter.action {
            next_condition(&mut query);
            query.push("t.action = ").push_bind(action.clone());
        }
        if let Some(entry_strategy) = &filter.entry_strategy {
            next_condition(&mut query);
            query
                .push("t.entry_strategy = ")
                .push_bind(entry_strategy.clone());
        }
        if let Some(min_bars) = filter.min_bars {
            next_condition(&mut query);
            query.push("t.bars >= ").push_bind(i64::from(min_bars));
        }
        if let Some(max_bars) = filter.max_bars {
            next_condition(&mut query);
            query.push("t.bars <= ").push_bind(i64::from(max_bars));
        }
        if let Some(start_time) = &filter.start_time {
            next_condition(&mut query);
            query.push("t.time >= ").push_bind(start_time.clone());
        }
        if let Some(end_time) = &filter.end_time {
            next_condition(&mut query);
            query.push("t.time <= ").push_bind(end_time.clone());
        }

        query.push(" ORDER BY t.date DESC, t.time DESC");

        let rows = query
            .build_query_as::<DbTrade>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = rows.len(), ?filter, "Fetched trades.");
        rows.into_iter().map(TradeRecord::try_from).collect()
    }

    pub async fn get_trade(&self, id: i64) -> Result<Option<TradeRecord>, DbError> {
        let row = sqlx::query_as::<_, DbTrade>(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades t JOIN instruments i ON t.instrument = i.name \
             WHERE t.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TradeRecord::try_from).transpose()
    }

    pub async fn update_trade_entry_strategy(
        &self,
        id: i64,
        entry_strategy: &str,
    ) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE trades SET entry_strategy = ? WHERE id = ?")
            .bind(entry_strategy)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    // ==========================================================================
    // Trade images
    // ==========================================================================

    pub async fn save_trade_images(
        &self,
        trade_id: i64,
        image_paths: &[String],
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for path in image_paths {
            sqlx::query("INSERT INTO trade_images (trade_id, image_path) VALUES (?, ?)")
                .bind(trade_id)
                .bind(path)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_trade_images(&self, trade_id: i64) -> Result<Vec<String>, DbError> {
        let paths = sqlx::query_scalar::<_, String>(
            "SELECT image_path FROM trade_images WHERE trade_id = ? ORDER BY id",
        )
        .bind(trade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(paths)
    }

    // ==========================================================================
    // Daily debrief
    // ==========================================================================

    pub async fn get_daily_debrief(&self, date: &str) -> Result<Option<DailyDebrief>, DbError> {
        let row = sqlx::query(
            "SELECT date, intraday_summary, feelings, recurring_patterns, best_play_out, leverage_info \
             FROM daily_debrief WHERE date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let text = |column: &str| -> Result<String, sqlx::Error> {
            Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
        };

        Ok(Some(DailyDebrief {
            date: row.try_get("date")?,
            intraday_summary: text("intraday_summary")?,
            feelings: text("feelings")?,
            recurring_patterns: text("recurring_patterns")?,
            best_play_out: text("best_play_out")?,
            leverage_info: text("leverage_info")?,
        }))
    }

    /// Inserts the debrief for its date, or replaces the one already stored.
    pub async fn save_daily_debrief(&self, debrief: &DailyDebrief) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO daily_debrief (
                date, intraday_summary, feelings, recurring_patterns, best_play_out, leverage_info
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                intraday_summary = excluded.intraday_summary,
                feelings = excluded.feelings,
                recurring_patterns = excluded.recurring_patterns,
                best_play_out = excluded.best_play_out,
                leverage_info = excluded.leverage_info
            "#,
        )
        .bind(&debrief.date)
        .bind(&debrief.intraday_summary)
        .bind(&debrief.feelings)
        .bind(&debrief.recurring_patterns)
        .bind(&debrief.best_play_out)
        .bind(&debrief.leverage_info)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Returns `true` when a new row was written.
async fn ensure_instrument(
    conn: &mut SqliteConnection,
    name: &str,
    default_multiplier: Decimal,
) -> Result<bool, DbError> {
    if name.is_empty() {
        return Ok(false);
    }
    let result = sqlx::query("INSERT OR IGNORE INTO instruments (name, multiplier) VALUES (?, ?)")
        .bind(name)
        .bind(to_real(default_multiplier)?)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_trade(conn: &mut SqliteConnection, trade: &NewTrade) -> Result<i64, DbError> {
    validate_trade(trade)?;
    ensure_instrument(conn, &trade.instrument, DEFAULT_MULTIPLIER).await?;
    // Stored dates must be ISO so they sort chronologically.
    let date = format_date(trade.date.trim());

    let result = sqlx::query(
        r#"
        INSERT INTO trades (
            date, time, instrument, action, quantity, price,
            commission, mae, mfe, bars, entry_strategy, notes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(date)
    .bind(&trade.time)
    .bind(&trade.instrument)
    .bind(&trade.action)
    .bind(trade.quantity)
    .bind(to_real(trade.price)?)
    .bind(to_real(trade.commission)?)
    .bind(to_real(trade.mae)?)
    .bind(to_real(trade.mfe)?)
    .bind(trade.bars)
    .bind(&trade.entry_strategy)
    .bind(&trade.notes)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}
