use std::fs::OpenOptions;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use rustic_db::database;
use rustic_db::heap_file::HeapFile;
use rustic_db::tuple::TupleDesc;
use rustic_db::types::Type;

static TABLE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Registers a fresh, uniquely-named heap file in the process-global
/// catalog backed by a temp file, and returns it. Tests that need an
/// isolated table use this instead of sharing `schemas.txt`-loaded
/// tables, since the catalog and buffer pool are process-wide.
pub fn fresh_table(dir: &tempfile::TempDir, td: TupleDesc) -> Arc<HeapFile> {
    let _ = env_logger::try_init();
    let n = TABLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = dir.path().join(format!("table_{}.dat", n));
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    let heap_file = HeapFile::new(file, &path, td);
    let db = database::get_global_db();
    let name = format!("test_table_{}", n);
    db.get_catalog().add_table(heap_file, name.clone());
    db.get_catalog().get_table_from_name(&name).unwrap()
}

pub fn int_string_desc() -> TupleDesc {
    TupleDesc::new(
        vec![Type::IntType, Type::StringType],
        vec!["id".to_string(), "name".to_string()],
    )
}
