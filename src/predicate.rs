use crate::fields::FieldVal;
use crate::tuple::Tuple;

/// Comparison operators usable in a `Predicate` or as the join condition
/// between two tuples' fields.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Op {
    Equals,
    GreaterThan,
    LessThan,
    GreaterThanOrEq,
    LessThanOrEq,
    NotEquals,
}

impl Op {
    pub fn apply(&self, lhs: &FieldVal, rhs: &FieldVal) -> bool {
        match self {
            Op::Equals => lhs == rhs,
            Op::NotEquals => lhs != rhs,
            Op::GreaterThan => matches!(lhs.partial_cmp(rhs), Some(std::cmp::Ordering::Greater)),
            Op::LessThan => matches!(lhs.partial_cmp(rhs), Some(std::cmp::Ordering::Less)),
            Op::GreaterThanOrEq => matches!(
                lhs.partial_cmp(rhs),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ),
            Op::LessThanOrEq => matches!(
                lhs.partial_cmp(rhs),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ),
        }
    }
}

/// A single-field predicate: `tuple[field_index] <op> operand`, evaluated
/// against one tuple at a time by `Filter`.
#[derive(Debug, Clone)]
pub struct Predicate {
    field_index: usize,
    op: Op,
    operand: FieldVal,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: FieldVal) -> Self {
        Predicate {
            field_index,
            op,
            operand,
        }
    }

    pub fn filter(&self, tuple: &Tuple) -> bool {
        match tuple.get_field(self.field_index) {
            Some(field) => self.op.apply(field, &self.operand),
            None => false,
        }
    }
}

/// The join condition between two tuples, each drawn from one side of a
/// join operator: `left[field1] <op> right[field2]`.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    field1: usize,
    op: Op,
    field2: usize,
}

impl JoinPredicate {
    pub fn new(field1: usize, op: Op, field2: usize) -> Self {
        JoinPredicate { field1, op, field2 }
    }

    pub fn filter(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.get_field(self.field1), right.get_field(self.field2)) {
            (Some(l), Some(r)) => self.op.apply(l, r),
            _ => false,
        }
    }
}
