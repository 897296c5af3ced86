use thiserror::Error;

#[derive(Error, Debug)]
pub enum KontoregelError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No rule with ID {0}")]
    NotFound(i64),

    #[error("Invalid rule: {0}")]
    Validation(String),

    #[error("Unknown condition type: {0}")]
    UnknownConditionType(String),

    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KontoregelError>;
