//! Display helpers for CLI output.

pub mod table;

pub use table::{circuit_table, list_table, render_list};
