mod aggregate;
mod delete;
mod filter;
mod insert;
mod join;
mod seq_scan;

pub use aggregate::Aggregate;
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use seq_scan::SeqScan;

use crate::error::DbResult;
use crate::tuple::{Tuple, TupleDesc};

/// Pull-based contract every relational operator implements. A caller
/// drives the tree with `open`, then alternates `has_next`/`next` until
/// exhausted, and finally `close`s it. `rewind` restarts iteration from
/// the beginning without reopening child operators.
pub trait OpIterator {
    fn open(&mut self) -> DbResult<()>;
    fn has_next(&mut self) -> DbResult<bool>;
    fn next(&mut self) -> DbResult<Option<Tuple>>;
    fn rewind(&mut self) -> DbResult<()>;
    fn close(&mut self);
    fn get_tuple_desc(&self) -> &TupleDesc;
}
