pub mod entry;
pub mod log_table;
