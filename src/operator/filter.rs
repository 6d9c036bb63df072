use crate::error::DbResult;
use crate::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Passes through only the child's tuples that satisfy a predicate.
/// Keeps a one-tuple lookahead buffer so `has_next` can answer without
/// consuming the next matching tuple.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    peeked: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Filter {
            predicate,
            child,
            peeked: None,
        }
    }

    fn fill_peek(&mut self) -> DbResult<()> {
        if self.peeked.is_some() {
            return Ok(());
        }
        while let Some(t) = self.child.next()? {
            if self.predicate.filter(&t) {
                self.peeked = Some(t);
                break;
            }
        }
        Ok(())
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.peeked = None;
        self.child.open()
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
        self.peeked = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.peeked = None;
        self.child.close()
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        self.child.get_tuple_desc()
    }
}
