use std::sync::Arc;

use lazy_static::lazy_static;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::log::LogFile;

lazy_static! {
    // Global database instance, binding the buffer pool, catalog, and
    // write-ahead log behind a single process-wide handle.
    static ref GLOBAL_DB: Arc<Database> = Arc::new(Database::new());
}

// Retrieves a reference to the global database instance
pub fn get_global_db() -> Arc<Database> {
    Arc::clone(&GLOBAL_DB)
}

pub struct Database {
    buffer_pool: BufferPool,
    catalog: Catalog,
    log_file: LogFile,
}

impl Database {
    pub fn new() -> Self {
        Database {
            buffer_pool: BufferPool::new(),
            catalog: Catalog::new(),
            log_file: LogFile::new(),
        }
    }

    pub fn get_buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn get_catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get_log_file(&self) -> &LogFile {
        &self.log_file
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
