use std::collections::HashMap;

use crate::error::{DbError, DbResult};
use crate::fields::{FieldVal, IntField};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

/// Aggregation operations supported over a grouping field (or the whole
/// table, when there is no grouping field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Per-group running state. `Avg` keeps `sum`/`count` separately and only
/// divides when the group's value is read out, so intermediate groups
/// never see a rounded running average.
#[derive(Default, Clone, Copy)]
struct GroupState {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

impl GroupState {
    fn new() -> Self {
        GroupState {
            count: 0,
            sum: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn merge(&mut self, v: i32) {
        self.count += 1;
        self.sum += v as i64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn value(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Count => self.count as i32,
            AggregateOp::Sum => self.sum as i32,
            // integer division truncates toward zero, matching the
            // field type's all-integer domain rather than promoting to a
            // floating point average.
            AggregateOp::Avg => (self.sum / self.count.max(1)) as i32,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

const NO_GROUPING_KEY: &str = "";

/// Aggregates integer-valued tuples, grouped by an optional field.
/// `group_field` of `None` aggregates the whole input into a single
/// result row.
pub struct IntegerAggregator {
    group_field: Option<usize>,
    group_field_type: Option<Type>,
    agg_field: usize,
    op: AggregateOp,
    groups: HashMap<FieldVal, GroupState>,
    no_group: GroupState,
    has_group: bool,
}

impl IntegerAggregator {
    pub fn new(group_field: Option<usize>, group_field_type: Option<Type>, agg_field: usize, op: AggregateOp) -> Self {
        IntegerAggregator {
            group_field,
            group_field_type,
            agg_field,
            op,
            groups: HashMap::new(),
            no_group: GroupState::new(),
            has_group: false,
        }
    }

    /// Fails with `SchemaMismatch` if the aggregate field isn't an int, or
    /// the group field's value doesn't match the declared group type.
    pub fn merge_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let value = match tuple.get_field(self.agg_field) {
            Some(FieldVal::IntField(f)) => f.get_value(),
            _ => return Err(DbError::SchemaMismatch),
        };
        match self.group_field {
            Some(idx) => {
                let key = tuple.get_field(idx).cloned().ok_or(DbError::SchemaMismatch)?;
                if let Some(expected) = self.group_field_type {
                    if key.get_type() != expected {
                        return Err(DbError::SchemaMismatch);
                    }
                }
                self.groups.entry(key).or_insert_with(GroupState::new).merge(value);
            }
            None => {
                self.no_group.merge(value);
                self.has_group = true;
            }
        }
        Ok(())
    }

    /// Tuples of `(group_value?, aggregate_value)`, one per group, or a
    /// single row when there is no grouping field.
    pub fn iterate(&self) -> Vec<Tuple> {
        let td = self.result_tuple_desc();
        if self.group_field.is_none() {
            if !self.has_group {
                return vec![];
            }
            let v = self.no_group.value(self.op);
            return vec![Tuple::new(vec![FieldVal::IntField(IntField::new(v))], &td)];
        }
        self.groups
            .iter()
            .map(|(key, state)| {
                let v = state.value(self.op);
                Tuple::new(
                    vec![key.clone(), FieldVal::IntField(IntField::new(v))],
                    &td,
                )
            })
            .collect()
    }

    pub fn result_tuple_desc(&self) -> TupleDesc {
        match (self.group_field, self.group_field_type) {
            (Some(_), Some(t)) => TupleDesc::new(vec![t, Type::IntType], vec!["group".to_string(), "aggregate".to_string()]),
            _ => TupleDesc::new(vec![Type::IntType], vec!["aggregate".to_string()]),
        }
    }
}

/// Aggregates string-valued tuples. Only `Count` is meaningful over a
/// string field, since strings have no numeric sum/avg/min/max.
pub struct StringAggregator {
    group_field: Option<usize>,
    group_field_type: Option<Type>,
    agg_field: usize,
    groups: HashMap<FieldVal, i64>,
    no_group: i64,
    has_group: bool,
}

impl StringAggregator {
    pub fn new(group_field: Option<usize>, group_field_type: Option<Type>, agg_field: usize, op: AggregateOp) -> Self {
        assert_eq!(op, AggregateOp::Count, "string fields only support COUNT");
        StringAggregator {
            group_field,
            group_field_type,
            agg_field,
            groups: HashMap::new(),
            no_group: 0,
            has_group: false,
        }
    }

    /// Fails with `SchemaMismatch` if the aggregate field isn't a string, or
    /// the group field's value doesn't match the declared group type.
    pub fn merge_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        if !matches!(tuple.get_field(self.agg_field), Some(FieldVal::StringField(_))) {
            return Err(DbError::SchemaMismatch);
        }
        match self.group_field {
            Some(idx) => {
                let key = tuple.get_field(idx).cloned().ok_or(DbError::SchemaMismatch)?;
                if let Some(expected) = self.group_field_type {
                    if key.get_type() != expected {
                        return Err(DbError::SchemaMismatch);
                    }
                }
                *self.groups.entry(key).or_insert(0) += 1;
            }
            None => {
                self.no_group += 1;
                self.has_group = true;
            }
        }
        Ok(())
    }

    pub fn iterate(&self) -> Vec<Tuple> {
        let td = self.result_tuple_desc();
        if self.group_field.is_none() {
            if !self.has_group {
                return vec![];
            }
            return vec![Tuple::new(
                vec![FieldVal::IntField(IntField::new(self.no_group as i32))],
                &td,
            )];
        }
        self.groups
            .iter()
            .map(|(key, count)| {
                Tuple::new(
                    vec![key.clone(), FieldVal::IntField(IntField::new(*count as i32))],
                    &td,
                )
            })
            .collect()
    }

    pub fn result_tuple_desc(&self) -> TupleDesc {
        match (self.group_field, self.group_field_type) {
            (Some(_), Some(t)) => TupleDesc::new(vec![t, Type::IntType], vec!["group".to_string(), "aggregate".to_string()]),
            _ => TupleDesc::new(vec![Type::IntType], vec!["aggregate".to_string()]),
        }
    }
}
