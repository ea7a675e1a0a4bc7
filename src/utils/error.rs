// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum DailyMedError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("DailyMed rate limit likely exceeded")]
    RateLimited,

    #[error("Could not find label: {0}")]
    LabelNotFound(String),

    #[error("No labels registered for NDC {0}")]
    NoLabelsForNdc(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Failed to parse DailyMed response: {0}")]
    Parse(String),

    #[error("Label markup error: {0}")]
    Label(#[from] LabelError),
}

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Malformed label XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Not an SPL document (root element <{0}>)")]
    NotALabel(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section label matched more than once: {0}")]
    DuplicateSection(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV input is missing required column: {0}")]
    MissingColumn(String),

    #[error("Unknown product NDC: {0}")]
    UnknownProduct(String),

    #[error("Invalid halal status: {0}")]
    InvalidStatus(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("DailyMed interaction failed: {0}")]
    DailyMed(#[from] DailyMedError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
