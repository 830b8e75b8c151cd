use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvCmpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid separator: {0}")]
    Separator(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, CsvCmpError>;
