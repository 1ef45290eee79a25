// ABOUTME: Database export module
// ABOUTME: Size estimation, mysqldump invocation and progress monitoring

pub mod dump;
pub mod estimation;
pub mod monitor;

pub use dump::{dump_file_name, ignore_table_flags, DumpPlan, MySqlOptionFile, DUMP_PROGRAM};
pub use estimation::{estimate_export_size, summarize_table_sizes, ExportEstimate, TableSizeEntry};
pub use monitor::{monitor_dump, read_output_size_mb, DumpOutcome, DEFAULT_POLL_INTERVAL};
