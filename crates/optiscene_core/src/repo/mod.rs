//! Document store contract, typed links and the SQLite implementation.
//!
//! # Responsibility
//! - Define the key/value document store the sync layer talks to.
//! - Isolate SQL details from features and the reconciler.
//!
//! # Invariants
//! - Every write validates the body for its `DocumentKind` first.
//! - Every successful update bumps the stored revision by one.
//! - Missing documents surface as `StoreError::NotFound`.

use crate::db::DbError;
use crate::model::{CodecError, DocumentKey, DocumentKind, ValidationError};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod link;
mod sqlite_store;

pub use link::DocumentLink;
pub use sqlite_store::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound(DocumentKey),
    Rejected {
        kind: DocumentKind,
        reason: ValidationError,
    },
    Db(DbError),
    Codec(CodecError),
    InvalidData(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "document not found: {key}"),
            Self::Rejected { kind, reason } => write!(f, "{kind} document rejected: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Rejected { reason, .. } => Some(reason),
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CodecError> for StoreError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// A document as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: DocumentKey,
    pub kind: DocumentKind,
    pub body: Value,
    pub revision: u64,
}

/// Key/value store of JSON documents.
///
/// Implementations must be shareable across threads; the scene reconciler
/// serializes its own read-modify-write cycles.
pub trait DocumentStore: Send + Sync {
    fn create(&self, kind: DocumentKind, body: &Value) -> StoreResult<DocumentKey>;
    fn read(&self, key: &DocumentKey) -> StoreResult<StoredDocument>;
    fn update(&self, key: &DocumentKey, body: &Value) -> StoreResult<()>;
    fn delete(&self, key: &DocumentKey) -> StoreResult<()>;
    fn list(&self, kind: DocumentKind) -> StoreResult<Vec<DocumentKey>>;
}
