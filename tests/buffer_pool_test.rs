mod common;

use rustic_db::error::DbError;
use rustic_db::fields::{FieldVal, IntField};
use rustic_db::heap_page::Permissions;
use rustic_db::transaction::TransactionId;
use rustic_db::tuple::Tuple;

/// Scenario 4: a transaction holding S on a page, sole holder, upgrades
/// to X in place when it requests a write lock on the same page.
#[test]
fn sole_shared_holder_upgrades_to_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let td = common::int_string_desc();
    let table = common::fresh_table(&dir, td.clone());

    let tid = TransactionId::new();
    let t = Tuple::new(
        vec![
            FieldVal::IntField(IntField::new(1)),
            FieldVal::StringField(rustic_db::fields::StringField::new("a".to_string(), 1)),
        ],
        &td,
    );
    table.insert_tuple(tid, t).unwrap();
    let db = rustic_db::database::get_global_db();
    db.get_buffer_pool().transaction_complete(tid, true).unwrap();

    let pid = rustic_db::heap_page::HeapPageId::new(table.get_id(), 0);
    let t2 = TransactionId::new();
    db.get_buffer_pool()
        .get_page(t2, pid, Permissions::ReadOnly)
        .unwrap();
    let upgraded = db.get_buffer_pool().get_page(t2, pid, Permissions::ReadWrite);
    assert!(upgraded.is_ok());
    db.get_buffer_pool().transaction_complete(t2, true).unwrap();
}

/// Scenario 5: two transactions both hold S on the same page; one of
/// them requesting X is denied and eventually times out with
/// TransactionAborted.
#[test]
fn exclusive_request_against_other_shared_holder_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let td = common::int_string_desc();
    let table = common::fresh_table(&dir, td.clone());

    let tid = TransactionId::new();
    let t = Tuple::new(
        vec![
            FieldVal::IntField(IntField::new(1)),
            FieldVal::StringField(rustic_db::fields::StringField::new("a".to_string(), 1)),
        ],
        &td,
    );
    table.insert_tuple(tid, t).unwrap();
    let db = rustic_db::database::get_global_db();
    db.get_buffer_pool().transaction_complete(tid, true).unwrap();

    let pid = rustic_db::heap_page::HeapPageId::new(table.get_id(), 0);
    let t1 = TransactionId::new();
    let t2 = TransactionId::new();
    db.get_buffer_pool()
        .get_page(t1, pid, Permissions::ReadOnly)
        .unwrap();
    db.get_buffer_pool()
        .get_page(t2, pid, Permissions::ReadOnly)
        .unwrap();

    let result = db.get_buffer_pool().get_page(t1, pid, Permissions::ReadWrite);
    assert!(matches!(result, Err(DbError::TransactionAborted)));

    db.get_buffer_pool().transaction_complete(t1, false).unwrap();
    db.get_buffer_pool().transaction_complete(t2, true).unwrap();
}

/// Scenario 6: committed writes survive a simulated process restart
/// (cache cleared, file reopened); aborted writes do not.
#[test]
fn commit_durability_vs_abort() {
    let dir = tempfile::tempdir().unwrap();
    let td = common::int_string_desc();
    let table = common::fresh_table(&dir, td.clone());
    let db = rustic_db::database::get_global_db();

    let tid_commit = TransactionId::new();
    let t = Tuple::new(
        vec![
            FieldVal::IntField(IntField::new(7)),
            FieldVal::StringField(rustic_db::fields::StringField::new("x".to_string(), 1)),
        ],
        &td,
    );
    table.insert_tuple(tid_commit, t).unwrap();
    db.get_buffer_pool()
        .transaction_complete(tid_commit, true)
        .unwrap();

    // Simulate killing the process: drop every cached page for this
    // table and re-read from disk.
    for page in 0..table.num_pages() {
        db.get_buffer_pool().discard_page(rustic_db::heap_page::HeapPageId::new(
            table.get_id(),
            page,
        ));
    }
    let tid_check = TransactionId::new();
    let values: Vec<i32> = table
        .iterator(tid_check)
        .map(|t| t.unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value())
        .collect();
    assert_eq!(values, vec![7]);
    db.get_buffer_pool().transaction_complete(tid_check, true).unwrap();

    let tid_abort = TransactionId::new();
    let t2 = Tuple::new(
        vec![
            FieldVal::IntField(IntField::new(8)),
            FieldVal::StringField(rustic_db::fields::StringField::new("y".to_string(), 1)),
        ],
        &td,
    );
    table.insert_tuple(tid_abort, t2).unwrap();
    db.get_buffer_pool()
        .transaction_complete(tid_abort, false)
        .unwrap();

    for page in 0..table.num_pages() {
        db.get_buffer_pool().discard_page(rustic_db::heap_page::HeapPageId::new(
            table.get_id(),
            page,
        ));
    }
    let tid_check2 = TransactionId::new();
    let values2: Vec<i32> = table
        .iterator(tid_check2)
        .map(|t| t.unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value())
        .collect();
    assert_eq!(values2, vec![7]);
    db.get_buffer_pool().transaction_complete(tid_check2, true).unwrap();
}

/// A standalone, small-capacity buffer pool (its cache is independent of
/// the process-wide pool, though it shares the global catalog for
/// loading pages on miss) cannot evict when every cached page is dirty,
/// and surfaces BufferFull rather than silently stalling or stealing an
/// uncommitted page.
#[test]
fn buffer_full_when_every_cached_page_is_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let td = rustic_db::tuple::TupleDesc::new(
        vec![rustic_db::types::Type::IntType],
        vec!["id".to_string()],
    );
    let table = common::fresh_table(&dir, td.clone());

    // Grow the file to 2 pages first, through the process-wide pool.
    let setup_tid = TransactionId::new();
    while table.num_pages() < 2 {
        let t = Tuple::new(vec![FieldVal::IntField(IntField::new(0))], &td);
        table.insert_tuple(setup_tid, t).unwrap();
    }
    rustic_db::database::get_global_db()
        .get_buffer_pool()
        .transaction_complete(setup_tid, true)
        .unwrap();

    let small_pool = rustic_db::buffer_pool::BufferPool::with_capacity(1);
    let pid0 = rustic_db::heap_page::HeapPageId::new(table.get_id(), 0);
    let pid1 = rustic_db::heap_page::HeapPageId::new(table.get_id(), 1);

    let tid = TransactionId::new();
    let page0 = small_pool.get_page(tid, pid0, Permissions::ReadWrite).unwrap();
    page0.write().unwrap().mark_dirty(true, tid);

    // Pool is at capacity (1) and its only page is dirty: fetching a
    // second page has nothing clean to evict.
    let result = small_pool.get_page(tid, pid1, Permissions::ReadWrite);
    assert!(matches!(result, Err(DbError::BufferFull)));
}
