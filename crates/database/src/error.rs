use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Rejected trade: {0}")]
    Validation(#[from] CoreError),

    #[error("A stored value does not fit the record type: {0}")]
    InvalidRow(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}
