//! Output formatting module
//!
//! Console rendering of runs, results and trees.

mod formatter;

pub use formatter::{ConsoleListener, OutputFormat, ResultFormatter};
