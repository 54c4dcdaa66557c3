// crates/revtape-debug/src/stepper.rs

//! Composite stepping operators.
//!
//! Each one loops over the primitive step in a chosen [`Direction`]. The
//! loop-stack bookkeeping ties the stack to the current command rather than
//! to the direction of travel, so the same termination conditions work
//! forwards and backwards. `run` honours breakpoints and watchpoints; the
//! structural steppers honour only exhaustion — the caller asked for a
//! structural destination.

use revtape_core::StepError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::Debugger;

/// Direction of travel through history.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }
}

impl Debugger {
    /// Step until a breakpoint, a watchpoint, or exhaustion.
    pub fn run(&mut self, dir: Direction) -> Result<bool, StepError> {
        loop {
            let unfinished = self.step(dir)?;
            if !unfinished {
                return Ok(false);
            }
            if self.is_at_breakpoint() {
                debug!(line = self.line_now(), "stopped at breakpoint");
                return Ok(true);
            }
            if self.is_at_watchpoint() {
                debug!(cell = self.pointer(), "stopped at watchpoint");
                return Ok(true);
            }
        }
    }

    /// Step until one pass through the current loop completes: stop as soon
    /// as the loop depth is back at (or below) its entry value. Over a
    /// non-loop command this is a single step.
    pub fn over(&mut self, dir: Direction) -> Result<bool, StepError> {
        let depth = self.loop_stack().len();
        loop {
            let unfinished = self.step(dir)?;
            if !unfinished || self.loop_stack().len() <= depth {
                return Ok(unfinished);
            }
        }
    }

    /// Repeat [`Debugger::over`] until control leaves the starting command,
    /// skipping every pass through the loop.
    pub fn over2(&mut self, dir: Direction) -> Result<bool, StepError> {
        let guard = self.current_command();
        loop {
            let unfinished = self.over(dir)?;
            if !unfinished || self.current_command() != guard {
                return Ok(unfinished);
            }
        }
    }

    /// Step until the enclosing loop has truly been exited — depth below
    /// the entry value *and* control is not sitting on the enclosing loop's
    /// guard for a re-evaluation. A no-op outside any loop.
    pub fn out(&mut self, dir: Direction) -> Result<bool, StepError> {
        let depth = self.loop_stack().len();
        if depth == 0 {
            debug!("not currently in a loop");
            return Ok(true);
        }
        let parent = self.vm().program().get(self.current_command()).parent;
        loop {
            let unfinished = self.step(dir)?;
            if !unfinished
                || (self.loop_stack().len() < depth && parent != Some(self.current_command()))
            {
                return Ok(unfinished);
            }
        }
    }

    /// Step until control reaches a different source line.
    pub fn next_line(&mut self, dir: Direction) -> Result<bool, StepError> {
        let entry_line = self.line_now();
        loop {
            let unfinished = self.step(dir)?;
            if !unfinished || self.line_now() != entry_line {
                return Ok(unfinished);
            }
        }
    }
}
