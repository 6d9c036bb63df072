use std::sync::Arc;

use crate::error::DbResult;
use crate::fields::{FieldVal, IntField};
use crate::heap_file::HeapFile;
use crate::tuple::{Tuple, TupleDesc};
use crate::transaction::TransactionId;
use crate::types::Type;

use super::OpIterator;

/// Inserts every tuple its child produces into a table, then yields a
/// single summary tuple holding the count inserted. Matches the rest of
/// the tree's pull contract by returning `None` from every `next` call
/// after that one row, rather than looping forever.
pub struct Insert {
    tid: TransactionId,
    table: Arc<HeapFile>,
    child: Box<dyn OpIterator>,
    td: TupleDesc,
    done: bool,
    count: Option<i32>,
}

impl Insert {
    pub fn new(tid: TransactionId, table: Arc<HeapFile>, child: Box<dyn OpIterator>) -> Self {
        Insert {
            tid,
            table,
            child,
            td: TupleDesc::new(vec![Type::IntType], vec!["count".to_string()]),
            done: false,
            count: None,
        }
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> DbResult<()> {
        self.done = false;
        self.count = None;
        self.child.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.table.insert_tuple(self.tid, tuple)?;
            count += 1;
        }
        self.done = true;
        self.count = Some(count);
        Ok(Some(Tuple::new(
            vec![FieldVal::IntField(IntField::new(count))],
            &self.td,
        )))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.open()
    }

    fn close(&mut self) {
        self.child.close();
        self.done = false;
        self.count = None;
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
