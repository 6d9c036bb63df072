use crate::aggregator::{AggregateOp, IntegerAggregator, StringAggregator};
use crate::error::DbResult;
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

use super::OpIterator;

enum Inner {
    Int(IntegerAggregator),
    Str(StringAggregator),
}

/// Blocking aggregation operator: fully drains its child on `open`,
/// building one running aggregate per group, then serves the results
/// one tuple at a time. The child must be re-drained on `rewind` since
/// nothing about the aggregate survives it.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    group_field: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    results: Vec<Tuple>,
    cursor: usize,
    td: TupleDesc,
}

impl Aggregate {
    pub fn new(child: Box<dyn OpIterator>, group_field: Option<usize>, agg_field: usize, op: AggregateOp) -> Self {
        let td = Self::build_tuple_desc(child.get_tuple_desc(), group_field, agg_field);
        Aggregate {
            child,
            group_field,
            agg_field,
            op,
            results: vec![],
            cursor: 0,
            td,
        }
    }

    fn build_tuple_desc(child_td: &TupleDesc, group_field: Option<usize>, _agg_field: usize) -> TupleDesc {
        match group_field.and_then(|i| child_td.get_field_type(i)) {
            Some(t) => TupleDesc::new(vec![*t, Type::IntType], vec!["group".to_string(), "aggregate".to_string()]),
            None => TupleDesc::new(vec![Type::IntType], vec!["aggregate".to_string()]),
        }
    }

    fn drain_child(&mut self) -> DbResult<()> {
        let child_td = self.child.get_tuple_desc().clone();
        let group_field_type = self.group_field.and_then(|i| child_td.get_field_type(i)).copied();
        let agg_field_type = child_td.get_field_type(self.agg_field).copied();

        let mut inner = match agg_field_type {
            Some(Type::StringType) => Inner::Str(StringAggregator::new(
                self.group_field,
                group_field_type,
                self.agg_field,
                self.op,
            )),
            _ => Inner::Int(IntegerAggregator::new(
                self.group_field,
                group_field_type,
                self.agg_field,
                self.op,
            )),
        };

        self.child.open()?;
        while let Some(tuple) = self.child.next()? {
            match &mut inner {
                Inner::Int(a) => a.merge_tuple(&tuple)?,
                Inner::Str(a) => a.merge_tuple(&tuple)?,
            }
        }
        self.child.close();

        self.results = match &inner {
            Inner::Int(a) => a.iterate(),
            Inner::Str(a) => a.iterate(),
        };
        self.cursor = 0;
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        self.drain_child()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(self.cursor < self.results.len())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if self.cursor >= self.results.len() {
            return Ok(None);
        }
        let t = self.results[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(t))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.drain_child()
    }

    fn close(&mut self) {
        self.results.clear();
        self.cursor = 0;
    }

    fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }
}
