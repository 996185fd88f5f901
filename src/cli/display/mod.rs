//! Shared table and color helpers for human-readable output.

pub mod colors;
pub mod table;

pub use colors::{colorize_score, colorize_status};
pub use table::{list_table, render_list};
