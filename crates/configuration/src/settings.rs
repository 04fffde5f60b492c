use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub calendar: Calendar,
    pub logging: Logging,
    pub storage: Storage,
    /// Instruments seeded into the store by `init`, with their contract multipliers.
    pub instruments: Vec<InstrumentConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Database::default(),
            calendar: Calendar::default(),
            logging: Logging::default(),
            storage: Storage::default(),
            instruments: Config::default_instruments(),
        }
    }
}

impl Config {
    /// The standard futures contracts and their point values.
    pub fn default_instruments() -> Vec<InstrumentConfig> {
        [
            ("ES", dec!(50)),          // E-mini S&P 500
            ("NQ", dec!(20)),          // E-mini NASDAQ-100
            ("YM", dec!(5)),           // E-mini Dow
            ("RTY", dec!(5)),          // E-mini Russell 2000
            ("CL", dec!(1000)),        // Crude Oil
            ("GC", dec!(100)),         // Gold
            ("SI", dec!(5000)),        // Silver
            ("ZB", dec!(1000)),        // 30-year Treasury Bonds
            ("ZN", dec!(1000)),        // 10-year Treasury Notes
            ("6E", dec!(125000)),      // Euro FX
            ("6J", dec!(12500000)),    // Japanese Yen
            ("6B", dec!(62500)),       // British Pound
            ("6C", dec!(100000)),      // Canadian Dollar
            ("ZC", dec!(50)),          // Corn
            ("ZS", dec!(50)),          // Soybeans
            ("ZW", dec!(50)),          // Wheat
        ]
        .into_iter()
        .map(|(name, multiplier)| InstrumentConfig {
            name: name.to_string(),
            multiplier,
        })
        .collect()
    }

    /// Rejects values the rest of the application cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.calendar.rollover_hour > 23 {
            return Err(ConfigError::ValidationError(format!(
                "calendar.rollover_hour must be between 0 and 23, got {}",
                self.calendar.rollover_hour
            )));
        }

        let mut seen = HashSet::new();
        for instrument in &self.instruments {
            if instrument.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "instrument names must not be empty".to_string(),
                ));
            }
            if instrument.multiplier < Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "instrument {} has a negative multiplier",
                    instrument.name
                )));
            }
            if !seen.insert(instrument.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "instrument {} is listed more than once",
                    instrument.name
                )));
            }
        }
        Ok(())
    }
}

/// Where the SQLite trade record store lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    /// A sqlx SQLite URL, e.g. `sqlite://trading_journal.db`.
    pub url: String,
    pub max_connections: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite://trading_journal.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Parameters for the trading-day calendar.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Calendar {
    /// Local hour at which a new trading day begins.
    pub rollover_hour: u32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self { rollover_hour: 15 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// Directory that attached trade screenshots are copied into.
    pub images_dir: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("static/images"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstrumentConfig {
    pub name: String,
    pub multiplier: Decimal,
}
