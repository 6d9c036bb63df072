pub mod aggregator;
pub mod buffer_pool;
pub mod catalog;
pub mod database;
pub mod error;
pub mod fields;
pub mod heap_file;
pub mod heap_page;
pub mod histogram;
pub mod lock_manager;
pub mod log;
pub mod operator;
pub mod predicate;
pub mod table_stats;
pub mod transaction;
pub mod tuple;
pub mod types;

/// Initializes the `env_logger` backend for the `log` facade used
/// throughout the crate. Safe to call more than once; only the first
/// call takes effect.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
