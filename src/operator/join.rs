use crate::error::DbResult;
use crate::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Nested-loop join: for each left tuple, rescans the right child
/// looking for matches. The right child must support `rewind`, since it
/// is scanned once per left tuple.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    td: TupleDesc,
    current_left: Option<Tuple>,
    peeked: Option<Tuple>,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Self {
        let td = TupleDesc::combine(left.get_tuple_desc(), right.get_tuple_desc());
        Join {
            predicate,
            left,
            right,
            td,
            current_left: None,
            peeked: None,
        }
    }

    fn fill_peek(&mut self) -> DbResult<()> {
        if self.peeked.is_some() {
            return Ok(());
        }
        if self.current_left.is_none() {
            self.current_left = self.left.next()?;
        }
        loop {
            let Some(left_tuple) = self.current_left.clone() else {
                return Ok(());
            };
            while let Some(right_tuple) = self.right.next()? {
                if self.predicate.filter(&left_tuple, &right_tuple) {
                    let mut fields = left_tuple.get_fields();
                    fields.extend(right_tuple.get_fields());
                    self.peeked = Some(Tuple::new(fields, &self.td));
                    return Ok(());
                }
            }
            self.right.rewind()?;
            self.current_left = self.left.next()?;
            if self.current_left.is_none() {
                return Ok(());
            }
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> DbResult<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
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
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.peeked = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.peeked = None;
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
