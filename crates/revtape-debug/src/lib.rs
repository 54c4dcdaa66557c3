// crates/revtape-debug/src/lib.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Debugger layer over the revtape VM: structured execution context (loop
//! stack, line tracking), breakpoints and watchpoints, direction-symmetric
//! composite steppers, and the structured views frontends render from.

pub mod controller;
pub mod errors;
pub mod stepper;
pub mod views;

// ---- Re-exports for workspace compatibility ----
pub use controller::Debugger;
pub use errors::ControlError;
pub use stepper::Direction;
pub use views::{CellMark, MarkKind, MemoryRow, MemoryWindow, SourceLine, SourceWindow, WatchEntry};
