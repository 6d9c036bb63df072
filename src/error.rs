use thiserror::Error;

/// Crate-wide error type covering the failure modes named in the storage
/// and execution layer: schema mismatches, page-local invariants, lock
/// timeouts, and eviction/I-O failures.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("schema mismatch")]
    SchemaMismatch,

    #[error("invalid page number {page} (file has {num_pages} pages)")]
    InvalidPage { page: usize, num_pages: usize },

    #[error("page is full")]
    PageFull,

    #[error("slot is already empty")]
    AlreadyEmpty,

    #[error("tuple is not on this page")]
    NotOnPage,

    #[error("transaction aborted (lock wait timed out)")]
    TransactionAborted,

    #[error("buffer pool is full and no clean page could be evicted")]
    BufferFull,

    #[error("value {value} is outside histogram range [{min}, {max}]")]
    OutOfRange { value: i32, min: i32, max: i32 },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("malformed schema line: {0}")]
    InvalidSchema(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;
