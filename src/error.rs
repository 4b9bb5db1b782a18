use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Quarter;
use crate::storage::validator::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Trade,
    Thesis,
    Screenshot,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Trade => f.write_str("Trade"),
            EntityKind::Thesis => f.write_str("Thesis"),
            EntityKind::Screenshot => f.write_str("Screenshot"),
        }
    }
}

/// Payload-free discriminant of [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Unreadable,
    CorruptData,
    InvalidEntity,
    Conflict,
    InvalidId,
    Serialization,
    UnknownIo,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data in {path:?}: {source}")]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid entity: {0}")]
    InvalidEntity(#[from] ValidationError),

    #[error("An active thesis already exists for {year} {quarter}: {existing_id}")]
    Conflict {
        year: i32,
        quarter: Quarter,
        existing_id: String,
    },

    #[error("Invalid id: {0:?}")]
    InvalidId(String),

    #[error("Failed to serialize entity: {0}")]
    Serialization(String),

    #[error("Filesystem error: {0}")]
    UnknownIo(#[from] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Unreadable { .. } => ErrorKind::Unreadable,
            StoreError::CorruptData { .. } => ErrorKind::CorruptData,
            StoreError::InvalidEntity(_) => ErrorKind::InvalidEntity,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::InvalidId(_) => ErrorKind::InvalidId,
            StoreError::Serialization(_) => ErrorKind::Serialization,
            StoreError::UnknownIo(_) => ErrorKind::UnknownIo,
        }
    }

    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
