// crates/revtape-debug/src/controller.rs

//! The debugger controller: a [`Vm`] plus the structured execution context
//! a frontend steps through — current/previous line, the dynamic loop
//! stack, breakpoints, and watchpoints.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use revtape_core::{parse, CommandRef, InputStream, OutputStream, ParseError, StepError, Vm};

use crate::errors::ControlError;
use crate::stepper::Direction;

pub struct Debugger {
    vm: Vm,
    line_now: u32,
    line_prev: u32,
    breakpoints: BTreeSet<u32>,
    watches: BTreeMap<i64, String>,
    loop_stack: Vec<CommandRef>,
}

impl Debugger {
    /// Parse `source` and wrap the resulting VM.
    pub fn new(
        source: &str,
        input: InputStream,
        output: OutputStream,
    ) -> Result<Self, ParseError> {
        let program = parse(source)?;
        Ok(Self::from_vm(Vm::new(program, input, output)))
    }

    /// Wrap an already-built VM (custom tape length, pre-seeded state).
    #[must_use]
    pub fn from_vm(vm: Vm) -> Self {
        Self {
            vm,
            line_now: 0,
            line_prev: 0,
            breakpoints: BTreeSet::new(),
            watches: BTreeMap::new(),
            loop_stack: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn vm(&self) -> &Vm {
        &self.vm
    }

    #[inline]
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// The command about to execute in the forward direction.
    #[inline]
    #[must_use]
    pub fn current_command(&self) -> CommandRef {
        self.vm.current_cmd()
    }

    /// The data pointer: a signed index in `[-len, len)`.
    #[inline]
    #[must_use]
    pub const fn pointer(&self) -> i64 {
        self.vm.pointer()
    }

    /// Read a tape cell without stepping.
    pub fn tape_cell(&self, index: i64) -> Result<u8, StepError> {
        self.vm.tape_read(index)
    }

    /// Line of the about-to-execute command.
    #[inline]
    #[must_use]
    pub const fn line_now(&self) -> u32 {
        self.line_now
    }

    /// Line before the most recent step.
    #[inline]
    #[must_use]
    pub const fn line_prev(&self) -> u32 {
        self.line_prev
    }

    /// Dynamic chain of enclosing loops of the current command, outermost
    /// first.
    #[inline]
    #[must_use]
    pub fn loop_stack(&self) -> &[CommandRef] {
        &self.loop_stack
    }

    #[inline]
    #[must_use]
    pub const fn breakpoints(&self) -> &BTreeSet<u32> {
        &self.breakpoints
    }

    #[inline]
    #[must_use]
    pub const fn watches(&self) -> &BTreeMap<i64, String> {
        &self.watches
    }

    /// One primitive step in `dir`. `Ok(false)` when that direction is
    /// exhausted (program end, or origin of history); other step failures
    /// propagate with the VM untouched.
    pub fn step(&mut self, dir: Direction) -> Result<bool, StepError> {
        let stepped = match dir {
            Direction::Forward => self.vm.step_forward(),
            Direction::Backward => self.vm.step_backward(),
        };
        match stepped {
            Ok(()) => {
                self.step_bookkeeping();
                Ok(true)
            }
            Err(e) if e.is_exhausted() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Line and loop-stack bookkeeping after every step. Depends only on
    /// the *new* current command and its static parent, never on the
    /// direction of travel, so the loop-stack invariant holds under both.
    fn step_bookkeeping(&mut self) {
        self.line_prev = self.line_now;
        let cmd = self.vm.current_cmd();
        self.line_now = self.vm.program().get(cmd).span.line;

        let head = self.loop_stack.last().copied();
        if head == Some(cmd) {
            // Re-arrived at the loop node after executing its body.
            self.loop_stack.pop();
        } else if let Some(parent) = self.vm.program().get(cmd).parent {
            if head != Some(parent) {
                self.loop_stack.push(parent);
            }
        }
    }

    /// A line transition landed on a breakpoint. Re-execution within the
    /// same line does not fire.
    #[must_use]
    pub fn is_at_breakpoint(&self) -> bool {
        self.line_prev != self.line_now && self.breakpoints.contains(&self.line_now)
    }

    /// The most recently applied step — executed, replayed, or undone —
    /// wrote a value, and the pointer sits on a watched cell.
    #[must_use]
    pub fn is_at_watchpoint(&self) -> bool {
        self.watches.contains_key(&self.vm.pointer()) && self.vm.last_applied_write().is_some()
    }

    pub fn add_breakpoint(&mut self, line: u32) -> Result<(), ControlError> {
        if self.breakpoints.insert(line) {
            Ok(())
        } else {
            Err(ControlError::DuplicateBreakpoint(line))
        }
    }

    pub fn remove_breakpoint(&mut self, line: u32) -> Result<(), ControlError> {
        if self.breakpoints.remove(&line) {
            Ok(())
        } else {
            Err(ControlError::NoSuchBreakpoint(line))
        }
    }

    /// Watch `index` under `name`. Cell indices are unique keys; names are
    /// labels.
    pub fn add_watch(&mut self, name: impl Into<String>, index: i64) -> Result<(), ControlError> {
        if let Some(existing) = self.watches.get(&index) {
            return Err(ControlError::DuplicateWatch {
                index,
                existing: existing.clone(),
            });
        }
        self.watches.insert(index, name.into());
        Ok(())
    }

    /// Remove the watch at `index`, returning its name.
    pub fn remove_watch_by_index(&mut self, index: i64) -> Result<String, ControlError> {
        self.watches
            .remove(&index)
            .ok_or(ControlError::NoSuchWatchIndex(index))
    }

    /// Search the labels for `name` and remove the first match, returning
    /// its name.
    pub fn remove_watch_by_name(&mut self, name: &str) -> Result<String, ControlError> {
        let index = self
            .watches
            .iter()
            .find(|(_, label)| label.as_str() == name)
            .map(|(&index, _)| index);
        match index {
            Some(index) => self.remove_watch_by_index(index),
            None => Err(ControlError::NoSuchWatchName(name.to_owned())),
        }
    }

    /// Open `path` in binary mode and make it the VM's input stream.
    /// History already recorded for `,` is unaffected.
    pub fn set_input_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let input = InputStream::from_file(path)?;
        self.vm.set_input(input);
        Ok(())
    }
}
