use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File does not exist: {0}")]
    FileNotFound(String),

    #[error("File is not a CSV file: {0}")]
    NotCsv(String),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Error reading CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error while importing: {0}")]
    Io(#[from] std::io::Error),
}
