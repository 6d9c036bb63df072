mod common;

use rustic_db::aggregator::AggregateOp;
use rustic_db::database;
use rustic_db::fields::{FieldVal, IntField};
use rustic_db::operator::{Aggregate, Delete, Filter, Insert, Join, OpIterator, SeqScan};
use rustic_db::predicate::{JoinPredicate, Op, Predicate};
use rustic_db::transaction::TransactionId;
use rustic_db::tuple::Tuple;
use rustic_db::types::Type;

fn int_desc() -> rustic_db::tuple::TupleDesc {
    rustic_db::tuple::TupleDesc::new(vec![Type::IntType], vec!["v".to_string()])
}

fn populate(table: &std::sync::Arc<rustic_db::heap_file::HeapFile>, values: &[i32]) {
    let td = int_desc();
    let tid = TransactionId::new();
    for &v in values {
        let t = Tuple::new(vec![FieldVal::IntField(IntField::new(v))], &td);
        table.insert_tuple(tid, t).unwrap();
    }
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();
}

#[test]
fn filter_passes_only_matching_tuples() {
    let dir = tempfile::tempdir().unwrap();
    let table = common::fresh_table(&dir, int_desc());
    populate(&table, &[1, 2, 3, 4, 5]);

    let tid = TransactionId::new();
    let scan = SeqScan::new(table.clone(), tid);
    let pred = Predicate::new(0, Op::GreaterThan, FieldVal::IntField(IntField::new(2)));
    let mut filter = Filter::new(pred, Box::new(scan));
    filter.open().unwrap();
    let mut values = vec![];
    while let Some(t) = filter.next().unwrap() {
        values.push(t.get_field(0).unwrap().clone().into_int().unwrap().get_value());
    }
    filter.close();
    values.sort();
    assert_eq!(values, vec![3, 4, 5]);
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();
}

#[test]
fn equi_join_matches_rows_from_both_sides() {
    let dir = tempfile::tempdir().unwrap();
    let left_table = common::fresh_table(&dir, int_desc());
    let right_table = common::fresh_table(&dir, int_desc());
    populate(&left_table, &[1, 2, 3]);
    populate(&right_table, &[2, 3, 4]);

    let tid = TransactionId::new();
    let left = SeqScan::new(left_table.clone(), tid);
    let right = SeqScan::new(right_table.clone(), tid);
    let jp = JoinPredicate::new(0, Op::Equals, 0);
    let mut join = Join::new(jp, Box::new(left), Box::new(right));
    join.open().unwrap();
    let mut rows = 0;
    while join.next().unwrap().is_some() {
        rows += 1;
    }
    join.close();
    assert_eq!(rows, 2); // matches on 2 and 3
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();
}

#[test]
fn aggregate_sum_without_grouping() {
    let dir = tempfile::tempdir().unwrap();
    let table = common::fresh_table(&dir, int_desc());
    populate(&table, &[1, 2, 3, 4]);

    let tid = TransactionId::new();
    let scan = SeqScan::new(table.clone(), tid);
    let mut agg = Aggregate::new(Box::new(scan), None, 0, AggregateOp::Sum);
    agg.open().unwrap();
    let result = agg.next().unwrap().unwrap();
    assert_eq!(
        result.get_field(0),
        Some(&FieldVal::IntField(IntField::new(10)))
    );
    assert!(agg.next().unwrap().is_none());
    agg.close();
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();
}

#[test]
fn insert_operator_reports_count_and_persists_rows() {
    let dir = tempfile::tempdir().unwrap();
    let src_table = common::fresh_table(&dir, int_desc());
    let dst_table = common::fresh_table(&dir, int_desc());
    populate(&src_table, &[10, 20, 30]);

    let tid = TransactionId::new();
    let scan = SeqScan::new(src_table.clone(), tid);
    let mut insert = Insert::new(tid, dst_table.clone(), Box::new(scan));
    insert.open().unwrap();
    let summary = insert.next().unwrap().unwrap();
    assert_eq!(
        summary.get_field(0),
        Some(&FieldVal::IntField(IntField::new(3)))
    );
    insert.close();
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();

    let tid2 = TransactionId::new();
    assert_eq!(dst_table.iterator(tid2).count(), 3);
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid2, true)
        .unwrap();
}

#[test]
fn delete_operator_removes_every_tuple_its_child_yields() {
    let dir = tempfile::tempdir().unwrap();
    let table = common::fresh_table(&dir, int_desc());
    populate(&table, &[1, 2, 3]);

    let tid = TransactionId::new();
    let scan = SeqScan::new(table.clone(), tid);
    let pred = Predicate::new(0, Op::GreaterThanOrEq, FieldVal::IntField(IntField::new(2)));
    let filter = Filter::new(pred, Box::new(scan));
    let mut delete = Delete::new(tid, Box::new(filter));
    delete.open().unwrap();
    let summary = delete.next().unwrap().unwrap();
    assert_eq!(
        summary.get_field(0),
        Some(&FieldVal::IntField(IntField::new(2)))
    );
    delete.close();
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid, true)
        .unwrap();

    let tid2 = TransactionId::new();
    let remaining: Vec<i32> = table
        .iterator(tid2)
        .map(|t| t.unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value())
        .collect();
    assert_eq!(remaining, vec![1]);
    database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(tid2, true)
        .unwrap();
}
