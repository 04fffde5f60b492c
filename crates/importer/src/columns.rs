use crate::error::ImportError;
use csv::StringRecord;

/// Column positions resolved from a CSV header row.
///
/// Where an export may use one of two names for the same field, the first name
/// listed wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub instrument: usize,
    pub timestamp: usize,
    pub action: ActionColumn,
    pub quantity: usize,
    pub price: usize,
    pub commission: Option<usize>,
    pub mae: Option<usize>,
    pub mfe: Option<usize>,
    pub bars: Option<usize>,
    pub strategy: Option<usize>,
}

/// Exports either carry a position label (`Long`/`Short`) or an explicit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionColumn {
    MarketPosition(usize),
    Action(usize),
}

impl ActionColumn {
    pub fn index(&self) -> usize {
        match self {
            ActionColumn::MarketPosition(i) | ActionColumn::Action(i) => *i,
        }
    }
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let either = |first: &str, second: &str| find(first).or_else(|| find(second));

        let instrument = find("Instrument").ok_or(ImportError::MissingColumn("Instrument"))?;
        let timestamp = either("Entry time", "Date/Time")
            .ok_or(ImportError::MissingColumn("Entry time or Date/Time"))?;
        let action = find("Market pos.")
            .map(ActionColumn::MarketPosition)
            .or_else(|| find("Action").map(ActionColumn::Action))
            .ok_or(ImportError::MissingColumn("Market pos. or Action"))?;
        let quantity =
            either("Qty", "Quantity").ok_or(ImportError::MissingColumn("Qty or Quantity"))?;
        let price = either("Entry price", "Price")
            .ok_or(ImportError::MissingColumn("Entry price or Price"))?;

        Ok(Self {
            instrument,
            timestamp,
            action,
            quantity,
            price,
            commission: find("Commission"),
            mae: find("MAE"),
            mfe: find("MFE"),
            bars: find("Bars"),
            strategy: find("Strategy"),
        })
    }
}
