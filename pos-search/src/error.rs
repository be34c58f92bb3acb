use thiserror::Error;

use crate::domain::{Collection, RecordId};

#[derive(Error, Debug)]
pub enum PosSearchError {
    #[error("Malformed spreadsheet: {0}")]
    MalformedFile(String),

    #[error("No valid data found in import file")]
    EmptyImport,

    #[error("Record {id} not found in {collection}")]
    RecordNotFound { collection: Collection, id: RecordId },

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PosSearchError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::RecordNotFound { .. } => 1,
            Self::EmptyImport => 2,
            Self::MalformedFile(_) => 3,
            Self::Config(_) => 4,
            Self::Store(_) => 5,
            Self::Io(_) | Self::Serialization(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, PosSearchError>;
