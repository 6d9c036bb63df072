use std::sync::Mutex;

use log::trace;

use crate::heap_page::HeapPage;
use crate::transaction::TransactionId;

/// A single write-ahead UPDATE record: the page's content immediately
/// before and immediately after the transaction's change. Replay/undo is
/// out of scope for this core; the log only needs to durably record the
/// update before the corresponding page write reaches disk.
pub struct UpdateRecord {
    pub tid: TransactionId,
    pub before_image: Vec<u8>,
    pub after_image: Vec<u8>,
}

/// Append-only log of UPDATE records. `force` stands in for the durability
/// barrier a real log would provide (fsync); here it is a no-op hook the
/// buffer pool calls before every page flush, preserving the WAL
/// ordering even though nothing downstream reads the log back.
pub struct LogFile {
    records: Mutex<Vec<UpdateRecord>>,
}

impl LogFile {
    pub fn new() -> Self {
        LogFile {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn log_write(&self, tid: TransactionId, before_image: &HeapPage, after_image: &HeapPage) {
        let record = UpdateRecord {
            tid,
            before_image: before_image.serialize(),
            after_image: after_image.serialize(),
        };
        trace!("logged UPDATE record for transaction {:?}", tid);
        self.records.lock().unwrap().push(record);
    }

    /// Durability barrier: in a production port this would fsync the log
    /// file. The in-memory log has nothing to force, so this is a no-op
    /// that documents where that call belongs in the flush protocol.
    pub fn force(&self) {}

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self::new()
    }
}
