use log::trace;

use crate::buffer_pool::PAGE_SIZE;
use crate::error::{DbError, DbResult};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub enum Permissions {
    ReadOnly,
    ReadWrite,
}

/// Representation of page id which just includes table id and page number
#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub struct HeapPageId {
    table_id: usize,
    page_number: usize,
}

impl HeapPageId {
    pub fn new(table_id: usize, page_number: usize) -> Self {
        HeapPageId {
            table_id,
            page_number,
        }
    }

    pub fn get_table_id(&self) -> usize {
        self.table_id
    }

    pub fn get_page_number(&self) -> usize {
        self.page_number
    }

    pub fn serialize(&self) -> Vec<usize> {
        vec![self.table_id, self.page_number]
    }
}

/**
 * Representation for a set of bytes of data read from disk.
 * Format is header bytes + tuple bytes. Header bytes indicate
 * whether or not a tuple is present in that slot on the page.
 * The number of bytes for header is equal to ceiling(# tuple slots / 8)
 */
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: HeapPageId,
    td: TupleDesc,
    header_size: usize,
    header: Vec<u8>,
    tuples: Vec<Tuple>,
    num_slots: usize,
    before_image: Vec<u8>,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    pub fn new(pid: HeapPageId, data: Vec<u8>, td: TupleDesc) -> DbResult<Self> {
        let num_slots = Self::num_slots_for(&td);
        let header_size = Self::header_size_for(num_slots);
        let header = data[..header_size].to_vec();

        let mut tuples = vec![];

        for i in 0..num_slots {
            if Self::get_slot(&header, i) {
                let start = header_size + i * td.get_size();
                let end = start + td.get_size();
                let tuple_data = &data[start..end];
                let mut tuple = Tuple::deserialize(tuple_data, &td)?;
                tuple.set_record_id(Some(crate::tuple::RecordId::new(pid, i)));
                tuples.push(tuple);
            } else {
                tuples.push(Tuple::new(vec![], &td));
            }
        }

        trace!(
            "deserialized page {:?}: {} slots, header {} bytes",
            pid,
            num_slots,
            header_size
        );

        Ok(HeapPage {
            pid,
            td,
            header_size,
            header,
            tuples,
            num_slots,
            before_image: data,
            dirtied_by: None,
        })
    }

    fn num_slots_for(td: &TupleDesc) -> usize {
        (PAGE_SIZE * 8) / (td.get_size() * 8 + 1)
    }

    fn header_size_for(num_slots: usize) -> usize {
        (num_slots + 7) / 8
    }

    pub fn get_id(&self) -> HeapPageId {
        self.pid
    }

    /// Snapshot of this page as it looked right after the last
    /// `set_before_image` call (construction, or commit).
    pub fn get_before_image(&self) -> DbResult<HeapPage> {
        HeapPage::new(self.pid, self.before_image.clone(), self.td.clone())
    }

    /// Rebind the before-image to the page's current serialized bytes.
    /// Called at commit, once the page's post-commit content is final.
    pub fn set_before_image(&mut self) {
        self.before_image = self.serialize();
    }

    /// Serialize this page to exactly `PAGE_SIZE` bytes: header, then
    /// `num_slots` fixed-width tuple slots (zero-filled when unused), then
    /// zero padding.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = self.header.clone();
        for i in 0..self.num_slots {
            if Self::get_slot(&self.header, i) {
                data.extend(self.tuples[i].serialize());
            } else {
                data.extend(vec![0; self.td.get_size()]);
            }
        }
        // pad the rest of the page with 0s
        data.extend(vec![0; PAGE_SIZE - data.len()]);
        data
    }

    fn get_slot(header: &[u8], i: usize) -> bool {
        let idx = i / 8;
        let bit = i % 8;
        if idx >= header.len() {
            return false;
        }
        let byte = header[idx];
        let mask = 1 << bit;
        byte & mask != 0
    }

    fn set_slot(header: &mut [u8], i: usize, value: bool) {
        let idx = i / 8;
        let bit = i % 8;
        let byte = header[idx];
        let mask = 1 << bit;
        if value {
            header[idx] = byte | mask;
        } else {
            header[idx] = byte & !mask;
        }
    }

    /// Insert into the lowest-index empty slot, assigning the tuple's
    /// record id. Fails with `PageFull` if there is no empty slot, or
    /// `SchemaMismatch` if the tuple's schema doesn't match this page's.
    pub fn add_tuple(&mut self, mut t: Tuple) -> DbResult<()> {
        if t.get_tuple_desc() != &self.td {
            return Err(DbError::SchemaMismatch);
        }
        let mut i = 0;
        while i < self.num_slots {
            if !Self::get_slot(&self.header, i) {
                t.set_record_id(Some(crate::tuple::RecordId::new(self.pid, i)));
                self.tuples[i] = t;
                Self::set_slot(&mut self.header, i, true);
                return Ok(());
            }
            i += 1;
        }
        Err(DbError::PageFull)
    }

    /// Clear the slot bit for `t`'s record id. Does not zero the slot
    /// bytes in memory; `serialize` zero-fills unused slots on its own.
    pub fn delete_tuple(&mut self, t: &Tuple) -> DbResult<()> {
        let rid = t.get_record_id().ok_or(DbError::NotOnPage)?;
        let tuple_no = rid.get_tuple_no();
        if rid.get_page_id() != self.pid {
            return Err(DbError::NotOnPage);
        }
        if !Self::get_slot(&self.header, tuple_no) {
            return Err(DbError::AlreadyEmpty);
        }

        let mut cleared = Tuple::new(vec![], &self.td);
        cleared.set_record_id(None);
        self.tuples[tuple_no] = cleared;
        Self::set_slot(&mut self.header, tuple_no, false);
        Ok(())
    }

    pub fn get_num_empty_slots(&self) -> usize {
        let mut count = 0;
        for i in 0..self.num_slots {
            if !Self::get_slot(&self.header, i) {
                count += 1;
            }
        }
        count
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        if dirty {
            self.dirtied_by = Some(tid);
        } else {
            self.dirtied_by = None;
        }
    }

    /// Returns the id of the transaction that dirtied this page, if any.
    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn iter(&self) -> HeapPageIterator {
        HeapPageIterator {
            page: self,
            index: 0,
        }
    }

    pub fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }
}

pub struct HeapPageIterator<'a> {
    page: &'a HeapPage,
    index: usize,
}

impl<'a> Iterator for HeapPageIterator<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.page.num_slots {
            if HeapPage::get_slot(&self.page.header, self.index) {
                let tuple = &self.page.tuples[self.index];
                self.index += 1;
                return Some(tuple);
            }
            self.index += 1;
        }
        None
    }
}
