// crates/revtape-core/src/vm.rs

//! The reversible execution engine.
//!
//! Every executed step appends a `(backward, forward)` delta pair to the
//! history; moving the cursor forward applies forward deltas, moving it
//! backward applies backward deltas. Only *new* execution touches the I/O
//! streams: replaying a `,` re-applies the recorded byte without consuming
//! input, and stepping over a `.` in either direction never re-emits.
//! Stream positions are likewise not rewound by backward steps.
//!
//! The data pointer is a signed index in `[-len, len)`: the left edge folds
//! onto the top of the tape, so cell `-1` is the tape's last byte. Moves
//! whose net target leaves that band fail with `TapeOutOfRange` before any
//! state changes.

use crate::delta::{History, StepDelta};
use crate::errors::StepError;
use crate::io::{InputStream, OutputStream};
use crate::program::{CommandKind, CommandRef, Program};

/// Default tape length.
pub const DEFAULT_TAPE_LEN: usize = 16_384;

/// The virtual machine: command graph, byte tape, data pointer, execution
/// history, and the streams bound to `,` and `.`.
pub struct Vm {
    program: Program,
    tape: Vec<u8>,
    ptr: i64,
    /// Command to execute when the cursor sits at the frontier.
    frontier: CommandRef,
    history: History,
    /// `(old, new)` cell bytes of the most recently applied step, when that
    /// step wrote a value; `None` after moves, guards, and output.
    last_write: Option<(u8, u8)>,
    input: InputStream,
    output: OutputStream,
}

impl Vm {
    /// Build a VM over `program` with the default tape length.
    #[must_use]
    pub fn new(program: Program, input: InputStream, output: OutputStream) -> Self {
        Self::with_tape_len(program, input, output, DEFAULT_TAPE_LEN)
    }

    /// Build a VM with an explicit tape length (at least one cell).
    #[must_use]
    pub fn with_tape_len(
        program: Program,
        input: InputStream,
        output: OutputStream,
        tape_len: usize,
    ) -> Self {
        let frontier = program.entry();
        Self {
            program,
            tape: vec![0; tape_len.max(1)],
            ptr: 0,
            frontier,
            history: History::new(),
            last_write: None,
            input,
            output,
        }
    }

    #[inline]
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Raw tape storage. Cells addressed by negative pointers live at the
    /// top of this slice.
    #[inline]
    #[must_use]
    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    #[inline]
    #[must_use]
    pub fn tape_len(&self) -> usize {
        self.tape.len()
    }

    /// The data pointer: a signed index in `[-len, len)`.
    #[inline]
    #[must_use]
    pub const fn pointer(&self) -> i64 {
        self.ptr
    }

    /// Storage index of `index`; indices in `[-len, 0)` address cells from
    /// the tape's top. `None` outside the reachable band.
    #[must_use]
    pub fn cell_index(&self, index: i64) -> Option<usize> {
        let len = self.tape.len() as i64;
        if (-len..len).contains(&index) {
            Some(index.rem_euclid(len) as usize)
        } else {
            None
        }
    }

    /// Storage index under the pointer.
    fn cell(&self) -> usize {
        self.ptr.rem_euclid(self.tape.len() as i64) as usize
    }

    #[inline]
    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Playback position in the history.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.history.cursor()
    }

    /// Steps ever executed and still retained.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// The command about to execute (or re-execute, when replaying).
    #[must_use]
    pub fn current_cmd(&self) -> CommandRef {
        match self.history.forward(self.history.cursor()) {
            Some(delta) => delta.cmd,
            None => self.frontier,
        }
    }

    /// True once the frontier has reached the terminal sentinel and there is
    /// no replayable future.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.history.at_frontier() && self.program.is_end(self.frontier)
    }

    /// Read a cell without stepping.
    pub fn tape_read(&self, index: i64) -> Result<u8, StepError> {
        self.cell_index(index)
            .map(|i| self.tape[i])
            .ok_or(StepError::TapeOutOfRange(index))
    }

    /// Edit a cell out-of-band. Pair with [`Vm::reset_future`]: recorded
    /// future deltas were produced against the unedited tape.
    pub fn tape_write(&mut self, index: i64, value: u8) -> Result<(), StepError> {
        match self.cell_index(index) {
            Some(i) => {
                self.tape[i] = value;
                Ok(())
            }
            None => Err(StepError::TapeOutOfRange(index)),
        }
    }

    /// Move the data pointer out-of-band. Same caveat as [`Vm::tape_write`].
    pub fn set_pointer(&mut self, index: i64) -> Result<(), StepError> {
        if self.cell_index(index).is_none() {
            return Err(StepError::TapeOutOfRange(index));
        }
        self.ptr = index;
        Ok(())
    }

    /// Swap the input stream. History already recorded for `,` commands is
    /// unaffected; only new execution reads from the new stream.
    pub fn set_input(&mut self, input: InputStream) {
        self.input = input;
    }

    /// Swap the output stream.
    pub fn set_output(&mut self, output: OutputStream) {
        self.output = output;
    }

    /// Flush the output stream.
    pub fn flush_output(&mut self) -> Result<(), StepError> {
        self.output.flush()
    }

    /// Step forward: replay recorded future if any, otherwise execute new.
    pub fn step_forward(&mut self) -> Result<(), StepError> {
        if self.history.at_frontier() {
            self.step_forward_new()
        } else {
            self.step_forward_replay()
        }
    }

    /// Execute the frontier command, appending one delta pair.
    ///
    /// Input reads, range checks, and output writes all happen before the
    /// pair is appended, so a failed step leaves the VM untouched.
    pub fn step_forward_new(&mut self) -> Result<(), StepError> {
        debug_assert!(self.history.at_frontier());
        let at = self.frontier;
        let forward = match &self.program.get(at).kind {
            CommandKind::End => return Err(StepError::EndOfProgram),
            CommandKind::Read => {
                let byte = self.input.read_byte()?;
                StepDelta::write(at, byte)
            }
            CommandKind::Write => {
                self.output.write_byte(self.tape[self.cell()])?;
                StepDelta::inert(at)
            }
            CommandKind::Move { delta } => {
                let target = self.ptr + i64::from(*delta);
                if self.cell_index(target).is_none() {
                    return Err(StepError::TapeOutOfRange(target));
                }
                StepDelta::jump(at, target)
            }
            CommandKind::Add { delta } => {
                StepDelta::write(at, self.tape[self.cell()].wrapping_add(*delta as u8))
            }
            CommandKind::Loop { .. } | CommandKind::Init => StepDelta::inert(at),
        };
        let backward = StepDelta {
            cmd: at,
            value: forward.value.map(|_| self.tape[self.cell()]),
            pos: forward.pos.map(|_| self.ptr),
        };
        self.last_write = backward.value.zip(forward.value);
        self.history.push(backward, forward);
        self.apply(forward);
        // Dispatch consults the post-step cell, so a loop guard sees the
        // value its body just produced.
        self.frontier = self.program.successor(at, self.tape[self.cell()]);
        Ok(())
    }

    /// Re-apply the recorded forward delta at the cursor. At the frontier
    /// there is nothing to replay.
    pub fn step_forward_replay(&mut self) -> Result<(), StepError> {
        let cursor = self.history.cursor();
        match self.history.forward(cursor).copied() {
            Some(delta) => {
                self.last_write = self
                    .history
                    .backward(cursor)
                    .and_then(|b| b.value)
                    .zip(delta.value);
                self.apply(delta);
                self.history.advance();
                Ok(())
            }
            None => Err(StepError::EndOfProgram),
        }
    }

    /// Undo the most recent past step by applying its backward delta.
    pub fn step_backward(&mut self) -> Result<(), StepError> {
        let cursor = self.history.cursor();
        if cursor == 0 {
            return Err(StepError::AtOrigin);
        }
        match self.history.backward(cursor - 1).copied() {
            Some(delta) => {
                self.last_write = delta
                    .value
                    .zip(self.history.forward(cursor - 1).and_then(|f| f.value));
                self.apply(delta);
                self.history.retreat();
                Ok(())
            }
            None => Err(StepError::AtOrigin),
        }
    }

    /// The `(old, new)` byte pair of the most recently applied step — the
    /// one just executed, replayed, or undone — when that step wrote the
    /// cell under the pointer.
    #[must_use]
    pub const fn last_applied_write(&self) -> Option<(u8, u8)> {
        self.last_write
    }

    /// Discard replayable future beyond `cursor + keep` steps. Use after
    /// editing tape or pointer out-of-band; the discarded deltas were
    /// recorded against the old state. Input stream positions are not
    /// rewound.
    pub fn reset_future(&mut self, keep: usize) {
        let new_len = self.history.cursor() + keep;
        if new_len >= self.history.len() {
            return;
        }
        // The first discarded delta names the command that would have run
        // there; it becomes the new frontier.
        if let Some(delta) = self.history.forward(new_len) {
            self.frontier = delta.cmd;
        }
        self.history.truncate(new_len);
    }

    /// Keep at most `keep` undoable steps; earlier history is discarded and
    /// the origin moves forward. Bounds history memory.
    pub fn reset_past(&mut self, keep: usize) {
        self.history.drop_past(keep);
    }

    fn apply(&mut self, delta: StepDelta) {
        if let Some(pos) = delta.pos {
            self.ptr = pos;
        }
        if let Some(value) = delta.value {
            let i = self.cell();
            self.tape[i] = value;
        }
    }
}
