//! Small odds and ends shared by the tile crates: logging setup, and formatting numbers and
//! timings for log lines.

pub mod logger;
mod time;

pub use crate::time::{elapsed_seconds, prettyprint_time, prettyprint_usize};
