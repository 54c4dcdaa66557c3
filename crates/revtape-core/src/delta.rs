// crates/revtape-core/src/delta.rs

//! Reversible per-step records and the execution history.

use crate::program::CommandRef;
use serde::{Deserialize, Serialize};

/// The record of one atomic command execution.
///
/// At most one of `value`/`pos` is populated: a cell write for `+`/`-`/`,`,
/// a pointer position for `<`/`>`. Loop guards, `.`, and sentinels record
/// neither. The forward delta holds what the command did; the paired
/// backward delta holds the value or position it overwrote.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepDelta {
    /// The command this delta belongs to.
    pub cmd: CommandRef,
    /// Byte written to the cell under the pointer.
    pub value: Option<u8>,
    /// Data-pointer position after (forward) or before (backward) the step.
    pub pos: Option<i64>,
}

impl StepDelta {
    /// A delta that changes nothing (guard dispatch, `.`, sentinels).
    #[inline]
    #[must_use]
    pub const fn inert(cmd: CommandRef) -> Self {
        Self { cmd, value: None, pos: None }
    }

    /// A delta that writes `value` to the cell under the pointer.
    #[inline]
    #[must_use]
    pub const fn write(cmd: CommandRef, value: u8) -> Self {
        Self { cmd, value: Some(value), pos: None }
    }

    /// A delta that moves the pointer to `pos`.
    #[inline]
    #[must_use]
    pub const fn jump(cmd: CommandRef, pos: i64) -> Self {
        Self { cmd, value: None, pos: Some(pos) }
    }
}

/// Parallel forward/backward delta arrays plus the playback cursor.
///
/// Indices `< cursor` are the past; indices `>= cursor` are replayable
/// future. `cursor <= len()` always holds. The arrays are kept parallel
/// (rather than zipped) so truncation and window shifts are single resizes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    forward: Vec<StepDelta>,
    backward: Vec<StepDelta>,
    cursor: usize,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps ever executed and still retained.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Current playback position, `0..=len()`.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// True when there is no replayable future: the next forward step
    /// executes a new command.
    #[inline]
    #[must_use]
    pub fn at_frontier(&self) -> bool {
        self.cursor == self.forward.len()
    }

    #[inline]
    #[must_use]
    pub fn forward(&self, i: usize) -> Option<&StepDelta> {
        self.forward.get(i)
    }

    #[inline]
    #[must_use]
    pub fn backward(&self, i: usize) -> Option<&StepDelta> {
        self.backward.get(i)
    }

    /// Append one (backward, forward) pair at the frontier and advance past
    /// it.
    pub(crate) fn push(&mut self, backward: StepDelta, forward: StepDelta) {
        debug_assert!(self.at_frontier());
        self.backward.push(backward);
        self.forward.push(forward);
        self.cursor += 1;
    }

    pub(crate) fn advance(&mut self) {
        debug_assert!(self.cursor < self.forward.len());
        self.cursor += 1;
    }

    pub(crate) fn retreat(&mut self) {
        debug_assert!(self.cursor > 0);
        self.cursor -= 1;
    }

    /// Truncate both arrays to `new_len` entries.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        debug_assert!(new_len >= self.cursor);
        self.forward.truncate(new_len);
        self.backward.truncate(new_len);
    }

    /// Shift the retained window so at most `keep` backward steps remain
    /// before the cursor.
    pub(crate) fn drop_past(&mut self, keep: usize) {
        let start = self.cursor.saturating_sub(keep);
        if start == 0 {
            return;
        }
        self.forward.drain(..start);
        self.backward.drain(..start);
        self.cursor -= start;
    }
}
