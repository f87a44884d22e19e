//! Error types for lectio operations.
//!
//! Only I/O and data loading can fail. Everything a reader does on a page
//! (selecting, copying, opening notes) is total and reports problems as
//! values or log records instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("No reading content found: {0}")]
    MissingContent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
