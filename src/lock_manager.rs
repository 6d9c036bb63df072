use std::borrow::BorrowMut;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::RwLockWriteGuard;
use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use rand::Rng;

use crate::error::{DbError, DbResult};
use crate::heap_page::HeapPageId;
use crate::heap_page::Permissions;
use crate::transaction::TransactionId;

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);
const LOCK_TIMEOUT_MIN_MS: u64 = 1000;
const LOCK_TIMEOUT_MAX_MS: u64 = 3000;

#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
struct Lock {
    tid: TransactionId,
    pid: HeapPageId,
    exclusive: bool,
}

/// Per-page S/X lock table with strict two-phase semantics: a transaction's
/// locks are only released at commit/abort (or, for the heap file's
/// full-page scan, by an explicit early release). Blocking is implemented
/// by the caller retrying a non-blocking acquire attempt in a bounded loop;
/// exceeding a randomized 1-3s timeout aborts the transaction. This
/// timeout is the sole deadlock-avoidance mechanism (no wound-wait, no
/// waits-for graph).
pub struct LockManager {
    page_to_locks: RwLock<HashMap<HeapPageId, HashSet<Lock>>>,
    transaction_to_locks: RwLock<HashMap<TransactionId, HashSet<Lock>>>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager {
            page_to_locks: RwLock::new(HashMap::new()),
            transaction_to_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Blocking acquire: retries `try_acquire` until granted or a
    /// randomized per-request timeout elapses, in which case the
    /// transaction must be aborted by the caller.
    pub fn acquire_lock(&self, tid: TransactionId, pid: HeapPageId, exclusive: bool) -> DbResult<()> {
        let timeout_ms = rand::thread_rng().gen_range(LOCK_TIMEOUT_MIN_MS..LOCK_TIMEOUT_MAX_MS);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.try_acquire(tid, pid, exclusive) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    "transaction {:?} timed out waiting for lock on {:?}",
                    tid, pid
                );
                return Err(DbError::TransactionAborted);
            }
            thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }

    /// Single non-blocking attempt to grant `tid` the requested mode on
    /// `pid`, per the grant matrix: no-op if already held in a sufficient
    /// mode, upgrade-in-place if `tid` is the sole S holder requesting X,
    /// otherwise granted only if there is no conflicting holder.
    fn try_acquire(&self, tid: TransactionId, pid: HeapPageId, exclusive: bool) -> bool {
        let mut page_to_locks = self.page_to_locks.write().unwrap();
        let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();

        if let Some(locks) = page_to_locks.get(&pid) {
            if let Some(existing) = locks.iter().find(|l| l.tid == tid) {
                // already holds X, or holds a mode at least as strong as requested
                if existing.exclusive || !exclusive {
                    return true;
                }
                // holds S, wants X: upgrade only if sole holder
                if locks.len() == 1 {
                    self.upgrade_lock(tid, pid, page_to_locks.borrow_mut(), transaction_to_locks.borrow_mut());
                    return true;
                }
                return false;
            }
            // no existing lock for this transaction: conflict if requesting X
            // while anyone holds anything, or requesting S while anyone holds X
            let conflict = if exclusive {
                !locks.is_empty()
            } else {
                locks.iter().any(|l| l.exclusive)
            };
            if conflict {
                return false;
            }
        }

        let page_locks = page_to_locks.entry(pid).or_insert_with(HashSet::new);
        let transaction_locks = transaction_to_locks.entry(tid).or_insert_with(HashSet::new);
        let lock = Lock { tid, pid, exclusive };
        page_locks.insert(lock);
        transaction_locks.insert(lock);
        true
    }

    // Upgrades a lock from read to write
    fn upgrade_lock(
        &self,
        tid: TransactionId,
        pid: HeapPageId,
        page_to_locks: &mut RwLockWriteGuard<HashMap<HeapPageId, HashSet<Lock>>>,
        transaction_to_locks: &mut RwLockWriteGuard<HashMap<TransactionId, HashSet<Lock>>>,
    ) {
        let page_locks = page_to_locks.get_mut(&pid).unwrap();
        let transaction_locks = transaction_to_locks.get_mut(&tid).unwrap();
        let old_lock = Lock {
            tid,
            pid,
            exclusive: false,
        };
        let new_lock = Lock {
            tid,
            pid,
            exclusive: true,
        };
        page_locks.remove(&old_lock);
        page_locks.insert(new_lock);
        transaction_locks.remove(&old_lock);
        transaction_locks.insert(new_lock);
    }

    // Releases all locks associated with the specified transaction
    pub fn release_locks(&self, tid: TransactionId) {
        let mut page_to_locks = self.page_to_locks.write().unwrap();
        let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();
        let held_locks = transaction_to_locks.remove(&tid).unwrap_or_default();
        for lock in held_locks.iter() {
            if let Some(page_locks) = page_to_locks.get_mut(&lock.pid) {
                page_locks.remove(lock);
                if page_locks.is_empty() {
                    page_to_locks.remove(&lock.pid);
                }
            }
        }
    }

    // Releases a single page's lock for the specified transaction, used by
    // the heap file insert scan to shed a write lock on a full page before
    // moving on to the next one.
    pub fn release_lock(&self, tid: TransactionId, pid: HeapPageId) {
        let mut page_to_locks = self.page_to_locks.write().unwrap();
        let mut transaction_to_locks = self.transaction_to_locks.write().unwrap();
        if let Some(locks) = transaction_to_locks.get_mut(&tid) {
            locks.retain(|l| l.pid != pid);
        }
        if let Some(locks) = page_to_locks.get_mut(&pid) {
            locks.retain(|l| l.tid != tid);
            if locks.is_empty() {
                page_to_locks.remove(&pid);
            }
        }
    }

    // Checks if the specified transaction has a lock on the specified page
    pub fn holds_lock(&self, tid: TransactionId, pid: HeapPageId) -> Option<Permissions> {
        let transaction_locks = self.transaction_to_locks.read().unwrap();
        let locks = transaction_locks.get(&tid)?;
        locks.iter().find(|l| l.pid == pid).map(|lock| {
            if lock.exclusive {
                Permissions::ReadWrite
            } else {
                Permissions::ReadOnly
            }
        })
    }

    // gets the set of pages locked by the specified transaction
    pub fn get_locked_pages(&self, tid: TransactionId) -> HashSet<HeapPageId> {
        let transaction_locks = self.transaction_to_locks.read().unwrap();
        match transaction_locks.get(&tid) {
            Some(locks) => locks.iter().map(|lock| lock.pid).collect(),
            None => HashSet::new(),
        }
    }
}
