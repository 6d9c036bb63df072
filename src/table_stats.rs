use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;
use log::debug;

use crate::database;
use crate::error::DbResult;
use crate::fields::FieldVal;
use crate::histogram::{IntHistogram, StringHistogram};
use crate::predicate::Op;
use crate::transaction::TransactionId;
use crate::tuple::TupleDesc;

const NUM_HISTOGRAM_BUCKETS: usize = 100;

/// Cost units charged per page read by `estimate_scan_cost`. This core
/// has no seek cost model, so every page (full or partial) costs the
/// same fixed unit.
pub const IO_COST_PER_PAGE: f64 = 1.0;

enum FieldHistogram {
    Int(IntHistogram),
    Str(StringHistogram),
}

/// Per-field selectivity histograms for one table, built from a two-pass
/// scan: the first pass finds each integer field's min/max to size its
/// histogram, the second pass populates every histogram with the table's
/// actual values.
pub struct TableStats {
    histograms: Vec<FieldHistogram>,
    num_tuples: usize,
    num_pages: usize,
}

impl TableStats {
    pub fn compute(table_id: usize, td: &TupleDesc) -> DbResult<Self> {
        let db = database::get_global_db();
        let table = db
            .get_catalog()
            .get_table_from_id(table_id)
            .ok_or(crate::error::DbError::NotOnPage)?;
        let tid = TransactionId::new();

        let mut mins = vec![i32::MAX; td.get_num_fields()];
        let mut maxes = vec![i32::MIN; td.get_num_fields()];
        let mut num_tuples = 0usize;

        for tuple in table.iterator(tid) {
            let tuple = tuple?;
            num_tuples += 1;
            for i in 0..td.get_num_fields() {
                if let Some(FieldVal::IntField(f)) = tuple.get_field(i) {
                    let v = f.get_value();
                    mins[i] = mins[i].min(v);
                    maxes[i] = maxes[i].max(v);
                }
            }
        }

        let mut histograms: Vec<FieldHistogram> = (0..td.get_num_fields())
            .map(|i| match td.get_field_type(i) {
                Some(crate::types::Type::IntType) => {
                    let (min, max) = if mins[i] <= maxes[i] {
                        (mins[i], maxes[i])
                    } else {
                        (0, 0)
                    };
                    FieldHistogram::Int(IntHistogram::new(NUM_HISTOGRAM_BUCKETS, min, max))
                }
                _ => FieldHistogram::Str(StringHistogram::new()),
            })
            .collect();

        for tuple in table.iterator(tid) {
            let tuple = tuple?;
            for (i, hist) in histograms.iter_mut().enumerate() {
                match (hist, tuple.get_field(i)) {
                    (FieldHistogram::Int(h), Some(FieldVal::IntField(f))) => {
                        h.add_value(f.get_value())?;
                    }
                    (FieldHistogram::Str(h), Some(FieldVal::StringField(f))) => {
                        h.add_value(&f.get_value());
                    }
                    _ => {}
                }
            }
        }

        let num_pages = table.num_pages();
        db.get_buffer_pool().transaction_complete(tid, true)?;
        debug!(
            "computed table stats for table {}: {} tuples, {} pages",
            table_id, num_tuples, num_pages
        );

        Ok(TableStats {
            histograms,
            num_tuples,
            num_pages,
        })
    }

    pub fn num_tuples(&self) -> usize {
        self.num_tuples
    }

    /// I/O cost of a full table scan, in cost units: one `IO_COST_PER_PAGE`
    /// per page, with no seek cost and partial pages counted as full.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.num_pages as f64 * IO_COST_PER_PAGE
    }

    /// Estimated number of rows a predicate of selectivity `sel` matches
    /// against this table.
    pub fn estimate_table_cardinality(&self, sel: f64) -> usize {
        (self.num_tuples as f64 * sel).floor() as usize
    }

    pub fn estimate_selectivity(&self, field: usize, op: Op, constant: &FieldVal) -> f64 {
        match (self.histograms.get(field), constant) {
            (Some(FieldHistogram::Int(h)), FieldVal::IntField(f)) => {
                h.estimate_selectivity(op, f.get_value())
            }
            (Some(FieldHistogram::Str(h)), FieldVal::StringField(f)) => {
                h.estimate_selectivity(op, &f.get_value())
            }
            _ => 1.0,
        }
    }
}

lazy_static! {
    /// Process-wide cache of computed table statistics, keyed by table
    /// id, so repeated query planning doesn't repeat the two-pass scan.
    static ref TABLE_STATS_CACHE: RwLock<HashMap<usize, std::sync::Arc<TableStats>>> =
        RwLock::new(HashMap::new());
}

pub fn get_table_stats(table_id: usize, td: &TupleDesc) -> DbResult<std::sync::Arc<TableStats>> {
    {
        let cache = TABLE_STATS_CACHE.read().unwrap();
        if let Some(stats) = cache.get(&table_id) {
            return Ok(std::sync::Arc::clone(stats));
        }
    }
    let stats = std::sync::Arc::new(TableStats::compute(table_id, td)?);
    TABLE_STATS_CACHE
        .write()
        .unwrap()
        .insert(table_id, std::sync::Arc::clone(&stats));
    Ok(stats)
}

pub fn invalidate_table_stats(table_id: usize) {
    TABLE_STATS_CACHE.write().unwrap().remove(&table_id);
}

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::heap_file::HeapFile;
    use crate::types::Type;

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn fresh_table(dir: &tempfile::TempDir, td: TupleDesc) -> (usize, TupleDesc) {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = dir.path().join(format!("stats_{}.dat", n));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let heap_file = HeapFile::new(file, &path, td.clone());
        let db = database::get_global_db();
        let name = format!("stats_table_{}", n);
        db.get_catalog().add_table(heap_file, name.clone());
        let table = db.get_catalog().get_table_from_name(&name).unwrap();
        (table.get_id(), td)
    }

    #[test]
    fn two_pass_scan_builds_selectivity_estimates() {
        let dir = tempfile::tempdir().unwrap();
        let td = TupleDesc::new(vec![Type::IntType], vec!["v".to_string()]);
        let (table_id, td) = fresh_table(&dir, td);
        let table = database::get_global_db()
            .get_catalog()
            .get_table_from_id(table_id)
            .unwrap();

        let tid = TransactionId::new();
        for v in 0..100 {
            let t = int_tuple(v, &td);
            table.insert_tuple(tid, t).unwrap();
        }
        database::get_global_db()
            .get_buffer_pool()
            .transaction_complete(tid, true)
            .unwrap();

        let stats = TableStats::compute(table_id, &td).unwrap();
        assert_eq!(stats.num_tuples(), 100);
        assert!(stats.estimate_scan_cost() > 0.0);
        assert_eq!(stats.estimate_table_cardinality(0.5), 50);

        let sel = stats.estimate_selectivity(
            0,
            Op::Equals,
            &FieldVal::IntField(IntField::new(50)),
        );
        assert!(sel > 0.0 && sel <= 1.0);
    }

    fn int_tuple(v: i32, td: &TupleDesc) -> crate::tuple::Tuple {
        crate::tuple::Tuple::new(vec![FieldVal::IntField(IntField::new(v))], td)
    }
}
