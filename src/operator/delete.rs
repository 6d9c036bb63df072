use crate::database;
use crate::error::{DbError, DbResult};
use crate::fields::{FieldVal, IntField};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

use super::OpIterator;

/// Deletes every tuple its child produces, then yields a single summary
/// tuple holding the count deleted. Each tuple's record id names the
/// page (and therefore the table) it came from, so this operator can sit
/// below any scan without being told which table to delete from.
pub struct Delete {
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    td: TupleDesc,
    done: bool,
}

impl Delete {
    pub fn new(tid: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Delete {
            tid,
            child,
            td: TupleDesc::new(vec![Type::IntType], vec!["count".to_string()]),
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let db = database::get_global_db();
        let catalog = db.get_catalog();
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            let rid = tuple.get_record_id().ok_or(DbError::NotOnPage)?;
            let table = catalog
                .get_table_from_id(rid.get_page_id().get_table_id())
                .ok_or(DbError::NotOnPage)?;
            table.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.done = true;
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
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
