use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use log::{debug, trace};

use crate::buffer_pool::PAGE_SIZE;
use crate::database;
use crate::error::{DbError, DbResult};
use crate::heap_page::{HeapPage, HeapPageId, Permissions};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

// Representation of a table stored in a file on disk. `numPages` is always
// `floor(file_len / PAGE_SIZE)` and growth only ever appends whole pages.
pub struct HeapFile {
    file: Mutex<File>,
    td: TupleDesc,
    id: usize,
}

impl HeapFile {
    /// `path` is used only to derive a stable table id (a hash of the
    /// absolute path), so the same on-disk file maps to the same id across
    /// process restarts.
    pub fn new(file: File, path: &std::path::Path, td: TupleDesc) -> Self {
        HeapFile {
            file: Mutex::new(file),
            td,
            id: stable_hash(path),
        }
    }

    // Retrieves the unique id of this table
    pub fn get_id(&self) -> usize {
        self.id
    }

    // Retrieves the tuple descriptor for this table
    pub fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    // Calculates the number of pages in this HeapFile
    pub fn num_pages(&self) -> usize {
        let file = self.file.lock().unwrap();
        file.metadata().unwrap().len() as usize / PAGE_SIZE
    }

    // Retrieves the page with the specified pid from disk. Fails if the
    // page number is at or beyond the current end of file.
    pub fn read_page(&self, pid: &HeapPageId) -> DbResult<HeapPage> {
        let page_no = pid.get_page_number();
        let mut file = self.file.lock().unwrap();
        let num_pages = file.metadata()?.len() as usize / PAGE_SIZE;
        if page_no >= num_pages {
            return Err(DbError::InvalidPage { page: page_no, num_pages });
        }
        let mut data = vec![0; PAGE_SIZE];
        file.seek(SeekFrom::Start((page_no * PAGE_SIZE) as u64))?;
        file.read_exact(&mut data)?;
        trace!("read page {:?} from disk", pid);
        HeapPage::new(*pid, data, self.td.clone())
    }

    // Writes the specified page to disk. The file may only be extended by
    // exactly one page at a time (contiguity invariant).
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let pid = page.get_id();
        let page_no = pid.get_page_number();
        let data = page.serialize();
        let mut file = self.file.lock().unwrap();
        let num_pages = file.metadata()?.len() as usize / PAGE_SIZE;
        if page_no > num_pages {
            return Err(DbError::InvalidPage { page: page_no, num_pages });
        }
        file.seek(SeekFrom::Start((page_no * PAGE_SIZE) as u64))?;
        file.write_all(&data)?;
        trace!("wrote page {:?} to disk", pid);
        Ok(())
    }

    // Appends a fresh all-zero page at the end of the file and returns its id.
    fn append_empty_page(&self) -> DbResult<HeapPageId> {
        let mut file = self.file.lock().unwrap();
        let num_pages = file.metadata()?.len() as usize / PAGE_SIZE;
        file.seek(SeekFrom::Start((num_pages * PAGE_SIZE) as u64))?;
        file.write_all(&vec![0u8; PAGE_SIZE])?;
        Ok(HeapPageId::new(self.id, num_pages))
    }

    // Adds the specified tuple to the file, returning the pages modified.
    // Scans existing pages for room; a page found to be full has its write
    // lock released immediately (per the relaxed-2PL contention tradeoff)
    // before moving on. Appends a new page only if none had room.
    pub fn insert_tuple(&self, tid: TransactionId, tuple: Tuple) -> DbResult<Vec<HeapPageId>> {
        let db = database::get_global_db();
        let bp = db.get_buffer_pool();
        let num_pages = self.num_pages();

        for page_no in 0..num_pages {
            let pid = HeapPageId::new(self.id, page_no);
            let page = bp.get_page(tid, pid, Permissions::ReadWrite)?;
            let has_room = {
                let page_read = page.read().unwrap();
                page_read.get_num_empty_slots() > 0
            };
            if has_room {
                let mut page_write = page.write().unwrap();
                page_write.add_tuple(tuple)?;
                page_write.mark_dirty(true, tid);
                return Ok(vec![pid]);
            }
            bp.release_page_lock(tid, pid);
        }

        let new_pid = self.append_empty_page()?;
        debug!("heap file {} grew to {} pages", self.id, num_pages + 1);
        let page = bp.get_page(tid, new_pid, Permissions::ReadWrite)?;
        let mut page_write = page.write().unwrap();
        page_write.add_tuple(tuple)?;
        page_write.mark_dirty(true, tid);
        Ok(vec![new_pid])
    }

    // Deletes the specified tuple from the file.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let db = database::get_global_db();
        let bp = db.get_buffer_pool();
        let rid = tuple.get_record_id().ok_or(DbError::NotOnPage)?;
        let pid = rid.get_page_id();
        let page = bp.get_page(tid, pid, Permissions::ReadWrite)?;
        let mut page_write = page.write().unwrap();
        page_write.delete_tuple(tuple)?;
        page_write.mark_dirty(true, tid);
        Ok(())
    }

    // Retrieves an iterator over every used tuple in this file, in
    // (page number, slot) order. Pages are fetched lazily through the
    // buffer pool with read intent; rewinding means constructing a fresh
    // iterator (no stateful positioning survives a rewind). Takes `self`
    // behind an `Arc` so operators can own the iterator without also
    // having to own or borrow the `HeapFile` itself.
    pub fn iterator(self: &std::sync::Arc<Self>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator {
            heap_file: std::sync::Arc::clone(self),
            current_page_index: 0,
            buffered: Vec::new().into_iter(),
            tid,
        }
    }
}

fn stable_hash(path: &std::path::Path) -> usize {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    let mut hasher = DefaultHasher::new();
    absolute.hash(&mut hasher);
    hasher.finish() as usize
}

pub struct HeapFileIterator {
    heap_file: std::sync::Arc<HeapFile>,
    current_page_index: usize,
    buffered: std::vec::IntoIter<Tuple>,
    tid: TransactionId,
}

impl Iterator for HeapFileIterator {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(t) = self.buffered.next() {
                return Some(Ok(t));
            }
            if self.current_page_index >= self.heap_file.num_pages() {
                return None;
            }
            let pid = HeapPageId::new(self.heap_file.get_id(), self.current_page_index);
            self.current_page_index += 1;
            let db = database::get_global_db();
            let bp = db.get_buffer_pool();
            let page = match bp.get_page(self.tid, pid, Permissions::ReadOnly) {
                Ok(p) => p,
                Err(e) => return Some(Err(e)),
            };
            let page_read = page.read().unwrap();
            let tuples: Vec<Tuple> = page_read.iter().cloned().collect();
            self.buffered = tuples.into_iter();
        }
    }
}
