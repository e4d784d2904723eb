//! Error type shared by the catalog store, directory sync and tag loader.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// `create_schema` was called on a database that already has catalog tables.
    #[error("catalog schema already exists (table `{0}` present); drop it first")]
    SchemaExists(String),

    #[error("cannot read image directory {path:?}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tag file {path:?}: {reason}")]
    InvalidTagFile { path: PathBuf, reason: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("no dataset info recorded; run with --init first")]
    NoDataset,

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoDataset)
    }
}

/// Map `QueryReturnedNoRows` onto a `NotFound` for the given entity.
pub(crate) trait OptionalRow<T> {
    fn or_not_found(self, entity: &'static str, key: impl ToString) -> Result<T>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn or_not_found(self, entity: &'static str, key: impl ToString) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CatalogError::not_found(entity, key)),
            Err(e) => Err(e.into()),
        }
    }
}
