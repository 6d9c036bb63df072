use std::thread;
use std::time::Duration;

use rustic_db::database;
use rustic_db::error::{DbError, DbResult};
use rustic_db::fields::{FieldVal, IntField, StringField};
use rustic_db::operator::{OpIterator, SeqScan};
use rustic_db::transaction::TransactionId;
use rustic_db::tuple::Tuple;

/// Runs `body` under a fresh transaction, retrying with a new transaction
/// id whenever it aborts on a lock timeout. Mirrors how a real client
/// driver is expected to use the engine: `TransactionAborted` is a
/// recoverable condition, not a fatal one.
fn with_retrying_transaction<F>(mut body: F) -> DbResult<()>
where
    F: FnMut(TransactionId) -> DbResult<()>,
{
    loop {
        let tid = TransactionId::new();
        match body(tid) {
            Ok(()) => return Ok(()),
            Err(DbError::TransactionAborted) => {
                let db = database::get_global_db();
                db.get_buffer_pool().transaction_complete(tid, false)?;
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e),
        }
    }
}

fn main() -> DbResult<()> {
    rustic_db::init_logging();

    let db = database::get_global_db();
    let mut schema_file_path = std::env::current_dir().unwrap();
    schema_file_path.push("schemas.txt");
    db.get_catalog()
        .load_schema(schema_file_path.to_str().unwrap())?;

    let table = db
        .get_catalog()
        .get_table_from_name("employees")
        .expect("employees table declared in schemas.txt");
    let table_id = table.get_id();
    let td = table.get_tuple_desc().clone();

    println!("table id: {}", table_id);
    println!("table name: {:?}", td.get_field_name(0));

    // Insert 3 rows concurrently, each from its own transaction, retrying
    // on abort rather than panicking.
    let handles: Vec<_> = (0..3)
        .map(|i| {
            let table = table.clone();
            let td = td.clone();
            thread::spawn(move || -> DbResult<()> {
                with_retrying_transaction(|tid| {
                    let name = format!("Alice_{}", i);
                    for j in 0..3 {
                        let tuple = Tuple::new(
                            vec![
                                FieldVal::IntField(IntField::new(j)),
                                FieldVal::StringField(StringField::new(name.clone(), 7)),
                            ],
                            &td,
                        );
                        table.insert_tuple(tid, tuple)?;
                    }
                    let db = database::get_global_db();
                    db.get_buffer_pool().transaction_complete(tid, true)
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("insert thread panicked")?;
    }

    // Scan the table back out through the pull-based operator tree.
    let tid = TransactionId::new();
    let mut scan = SeqScan::new(table.clone(), tid);
    scan.open()?;
    let mut tuple_count = 0;
    while let Some(tuple) = scan.next()? {
        println!("tuple: {}", tuple);
        tuple_count += 1;
    }
    scan.close();
    db.get_buffer_pool().transaction_complete(tid, true)?;

    println!("page count: {}", table.num_pages());
    println!("tuple count: {}", tuple_count);

    Ok(())
}
