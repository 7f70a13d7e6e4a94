//! CLI command handlers, one file per command.

mod check;
mod upload;

pub use check::run_check;
pub use upload::run_upload;

#[cfg(test)]
pub(crate) use upload::{progress_line, report_lines};
