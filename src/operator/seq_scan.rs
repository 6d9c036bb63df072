use std::sync::Arc;

use crate::error::DbResult;
use crate::heap_file::{HeapFile, HeapFileIterator};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Leaf operator that pulls every tuple out of one table's heap file, in
/// storage order. `has_next` peeks one tuple ahead so it can be called
/// without consuming state, matching the contract the rest of the
/// operator tree relies on.
pub struct SeqScan {
    table: Arc<HeapFile>,
    tid: TransactionId,
    td: TupleDesc,
    iter: Option<HeapFileIterator>,
    peeked: Option<Tuple>,
}

impl SeqScan {
    pub fn new(table: Arc<HeapFile>, tid: TransactionId) -> Self {
        let td = table.get_tuple_desc().clone();
        SeqScan {
            table,
            tid,
            td,
            iter: None,
            peeked: None,
        }
    }

    fn fill_peek(&mut self) -> DbResult<()> {
        if self.peeked.is_some() {
            return Ok(());
        }
        if let Some(iter) = self.iter.as_mut() {
            if let Some(t) = iter.next() {
                self.peeked = Some(t?);
            }
        }
        Ok(())
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        self.iter = Some(self.table.iterator(self.tid));
        self.peeked = None;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.fill_peek()?;
        Ok(self.peeked.is_some())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        self.fill_peek()?;
        Ok(self.peeked.take())
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.open()
    }

    fn close(&mut self) {
        self.iter = None;
        self.peeked = None;
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
