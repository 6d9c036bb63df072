use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::{debug, trace};

use crate::database;
use crate::error::{DbError, DbResult};
use crate::heap_page::{HeapPage, HeapPageId, Permissions};
use crate::lock_manager::LockManager;
use crate::transaction::TransactionId;

pub const PAGE_SIZE: usize = 4096;
pub const DEFAULT_PAGES: usize = 50;

/// Bounded cache of pages kept in memory, guarded by a strict two-phase
/// lock manager. Eviction is NO-STEAL: a dirty page can never be written
/// to disk ahead of its owning transaction's commit, so only clean pages
/// are eviction candidates. If every cached page is dirty, eviction fails
/// outright rather than violating that rule.
pub struct BufferPool {
    id_to_page: RwLock<HashMap<HeapPageId, Arc<RwLock<HeapPage>>>>,
    lock_manager: LockManager,
    num_pages: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool::with_capacity(DEFAULT_PAGES)
    }

    pub fn with_capacity(num_pages: usize) -> Self {
        BufferPool {
            id_to_page: RwLock::new(HashMap::new()),
            num_pages,
            lock_manager: LockManager::new(),
        }
    }

    /// Retrieves the specified page from cache or disk, first acquiring
    /// the requested lock on behalf of `tid`. Blocks (via the lock
    /// manager's bounded retry loop) until granted or the transaction
    /// times out.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: HeapPageId,
        perm: Permissions,
    ) -> DbResult<Arc<RwLock<HeapPage>>> {
        let exclusive = perm == Permissions::ReadWrite;
        self.lock_manager.acquire_lock(tid, pid, exclusive)?;

        {
            let id_to_page = self.id_to_page.read().unwrap();
            if let Some(page) = id_to_page.get(&pid) {
                return Ok(Arc::clone(page));
            }
        }

        let mut id_to_page = self.id_to_page.write().unwrap();
        // another thread may have populated the entry while we waited for the write lock
        if let Some(page) = id_to_page.get(&pid) {
            return Ok(Arc::clone(page));
        }
        if id_to_page.len() >= self.num_pages {
            self.evict_page(&mut id_to_page)?;
        }

        let db = database::get_global_db();
        let catalog = db.get_catalog();
        let table = catalog
            .get_table_from_id(pid.get_table_id())
            .ok_or(DbError::NotOnPage)?;
        let page = table.read_page(&pid)?;
        id_to_page.insert(pid, Arc::new(RwLock::new(page)));
        Ok(Arc::clone(id_to_page.get(&pid).unwrap()))
    }

    /// Releases a single page's lock without evicting it from cache. Used
    /// by the heap file insert scan to shed a write lock on a page found
    /// to be full before moving on to the next candidate.
    pub fn release_page_lock(&self, tid: TransactionId, pid: HeapPageId) {
        self.lock_manager.release_lock(tid, pid);
    }

    /// Evicts the first clean page found. NO-STEAL forbids evicting a
    /// dirty page, since that would write an uncommitted transaction's
    /// changes to disk; if every page is dirty, the pool has no room and
    /// eviction fails.
    fn evict_page(&self, id_to_page: &mut HashMap<HeapPageId, Arc<RwLock<HeapPage>>>) -> DbResult<()> {
        let victim = id_to_page
            .iter()
            .find(|(_, page)| page.read().unwrap().is_dirty().is_none())
            .map(|(pid, _)| *pid);
        match victim {
            Some(pid) => {
                id_to_page.remove(&pid);
                trace!("evicted clean page {:?}", pid);
                Ok(())
            }
            None => Err(DbError::BufferFull),
        }
    }

    /// Commits or aborts `tid`, flushing or reverting every page it
    /// dirtied, then releasing all of its locks. On commit, each dirty
    /// page is logged and forced before being written to disk, and its
    /// before-image is rebound to the now-durable content. On abort, each
    /// dirty page is replaced with its before-image in place, discarding
    /// the transaction's uncommitted changes without ever having touched
    /// disk.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        let locked_pages = self.lock_manager.get_locked_pages(tid);
        let id_to_page = self.id_to_page.read().unwrap();
        for pid in locked_pages {
            let Some(page) = id_to_page.get(&pid) else {
                continue;
            };
            let mut page = page.write().unwrap();
            if page.is_dirty().is_none() {
                continue;
            }
            if commit {
                self.flush_page_locked(tid, &mut page)?;
                page.set_before_image();
            } else {
                *page = page.get_before_image()?;
            }
            page.mark_dirty(false, tid);
        }
        drop(id_to_page);
        self.lock_manager.release_locks(tid);
        debug!(
            "transaction {:?} {}",
            tid,
            if commit { "committed" } else { "aborted" }
        );
        Ok(())
    }

    /// Writes a single dirty page to disk, logging its before/after image
    /// and forcing the log first so the write-ahead ordering holds even
    /// though nothing downstream replays the log.
    fn flush_page_locked(&self, tid: TransactionId, page: &mut HeapPage) -> DbResult<()> {
        let before = page.get_before_image()?;
        let db = database::get_global_db();
        db.get_log_file().log_write(tid, &before, page);
        db.get_log_file().force();
        let catalog = db.get_catalog();
        let table = catalog
            .get_table_from_id(page.get_id().get_table_id())
            .ok_or(DbError::NotOnPage)?;
        table.write_page(page)
    }

    /// Flushes every dirty page in the pool to disk, regardless of owner.
    /// Does not rebind the before-image: that only happens at commit, so a
    /// plain flush still leaves `transaction_complete(tid, false)` able to
    /// roll a page back to its pre-transaction bytes.
    pub fn flush_all_pages(&self) -> DbResult<()> {
        let id_to_page = self.id_to_page.read().unwrap();
        for page in id_to_page.values() {
            let mut page = page.write().unwrap();
            if let Some(tid) = page.is_dirty() {
                self.flush_page_locked(tid, &mut page)?;
                page.mark_dirty(false, tid);
            }
        }
        Ok(())
    }

    /// Flushes only the pages dirtied by `tid`. Same before-image caveat as
    /// `flush_all_pages`.
    pub fn flush_pages(&self, tid: TransactionId) -> DbResult<()> {
        let locked_pages = self.lock_manager.get_locked_pages(tid);
        let id_to_page = self.id_to_page.read().unwrap();
        for pid in locked_pages {
            if let Some(page) = id_to_page.get(&pid) {
                let mut page = page.write().unwrap();
                if page.is_dirty() == Some(tid) {
                    self.flush_page_locked(tid, &mut page)?;
                    page.mark_dirty(false, tid);
                }
            }
        }
        Ok(())
    }

    /// Drops a page from the cache without flushing it, used to discard
    /// stale pages after an out-of-band change to the underlying file.
    pub fn discard_page(&self, pid: HeapPageId) {
        self.id_to_page.write().unwrap().remove(&pid);
    }

    pub fn get_num_pages(&self) -> usize {
        self.num_pages
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
