// crates/revtape-debug/src/errors.rs

//! Controller-level errors for breakpoint and watch management.
//!
//! These are rejections, not failures: the controller's state is unchanged
//! whenever one is returned.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("already breaking on line {0}")]
    DuplicateBreakpoint(u32),
    #[error("line {0} is not a breakpoint")]
    NoSuchBreakpoint(u32),
    #[error("a watch at cell {index} is already present as '{existing}'")]
    DuplicateWatch { index: i64, existing: String },
    #[error("no watch found at cell {0}")]
    NoSuchWatchIndex(i64),
    #[error("no watch found named '{0}'")]
    NoSuchWatchName(String),
}
