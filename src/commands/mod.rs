// ABOUTME: Command implementations for each CLI subcommand
// ABOUTME: Exports estimate and dump commands

pub mod dump;
pub mod estimate;

pub use dump::{dump, DumpOptions, COMPLETION_MESSAGE};
pub use estimate::{estimate, render_estimate};
