use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Trade failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),
}
