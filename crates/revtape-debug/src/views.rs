// crates/revtape-debug/src/views.rs

//! Structured snapshots for frontends: memory rows, source lines with the
//! current-command span, and the watch table. Data only — rendering,
//! colour, and pagination belong to the consumer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::controller::Debugger;

/// How a cell in a memory row is marked.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarkKind {
    /// The data pointer sits here.
    Pointer,
    /// A watched cell.
    Watch,
    /// A watched cell the pointer currently sits on.
    PointerWatch,
}

/// A marked cell within a [`MemoryRow`], by offset from the row base.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellMark {
    pub offset: usize,
    pub kind: MarkKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryRow {
    /// Tape index of the first cell in this row.
    pub base: usize,
    pub cells: Vec<u8>,
    pub marks: Vec<CellMark>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryWindow {
    pub rows: Vec<MemoryRow>,
    /// Cells remain past the window.
    pub more: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLine {
    pub line_no: u32,
    /// Line text without its trailing newline.
    pub text: String,
    pub is_breakpoint: bool,
    /// Column span of the current command within this line, when it lies
    /// here.
    pub highlight: Option<(u32, u32)>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceWindow {
    /// Half-open line range `[start_line, end_line)`.
    pub start_line: u32,
    pub end_line: u32,
    pub lines: Vec<SourceLine>,
    /// Lines remain below the window.
    pub more: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchEntry {
    pub name: String,
    /// Watched index, signed like the data pointer.
    pub index: i64,
    pub value: u8,
    /// `(old, new)` when the most recently applied step wrote this cell.
    pub pending_change: Option<(u8, u8)>,
}

impl Debugger {
    /// Rows of `width` cells of tape storage starting at `start`; `None`
    /// aligns the window so the pointer's row begins at a multiple of
    /// `width`. Pointer and watch marks land on storage cells, so watches
    /// left of the origin show up at the top of the tape where they live.
    #[must_use]
    pub fn memory_window(&self, start: Option<usize>, width: usize, rows: usize) -> MemoryWindow {
        let vm = self.vm();
        let tape = vm.tape();
        let ptr_cell = vm.cell_index(self.pointer());
        let watch_cells: BTreeSet<usize> = self
            .watches()
            .keys()
            .filter_map(|&index| vm.cell_index(index))
            .collect();

        let width = width.max(1);
        let mut base = start.unwrap_or_else(|| ptr_cell.map_or(0, |p| p - p % width));
        let mut out = Vec::new();
        for _ in 0..rows {
            if base >= tape.len() {
                break;
            }
            let end = (base + width).min(tape.len());
            let mut marks = Vec::new();
            for (offset, index) in (base..end).enumerate() {
                let watched = watch_cells.contains(&index);
                let kind = match (ptr_cell == Some(index), watched) {
                    (true, true) => Some(MarkKind::PointerWatch),
                    (true, false) => Some(MarkKind::Pointer),
                    (false, true) => Some(MarkKind::Watch),
                    (false, false) => None,
                };
                if let Some(kind) = kind {
                    marks.push(CellMark { offset, kind });
                }
            }
            out.push(MemoryRow {
                base,
                cells: tape[base..end].to_vec(),
                marks,
            });
            base = end;
        }
        MemoryWindow {
            rows: out,
            more: base < tape.len(),
        }
    }

    /// A clamped window of `count` lines centred (when possible) on
    /// `center`, which defaults to the current command's line.
    #[must_use]
    pub fn source_window(&self, center: Option<u32>, count: u32) -> SourceWindow {
        let program = self.vm().program();
        let line_count = program.line_count();
        let span = program.get(self.current_command()).span;
        let center = center.unwrap_or(span.line);
        let count = count.max(1).min(line_count);

        let mut start = i64::from(center) - i64::from(count / 2);
        let mut end = start + i64::from(count);
        if start < 0 {
            end -= start;
            start = 0;
        }
        if end > i64::from(line_count) {
            start -= end - i64::from(line_count);
            end = i64::from(line_count);
        }
        let start = start.max(0) as u32;
        let end = end.max(0) as u32;

        let mut lines = Vec::new();
        for line_no in start..end {
            let text = program.line_text(line_no).unwrap_or_default().to_owned();
            let highlight = (span.line == line_no)
                .then(|| {
                    let line_start = program.line_start(line_no).unwrap_or(0);
                    let s = span.start.saturating_sub(line_start);
                    let e = span.end.saturating_sub(line_start).min(text.len() as u32);
                    ((s as usize) < text.len() && e > s).then_some((s, e))
                })
                .flatten();
            lines.push(SourceLine {
                line_no,
                text,
                is_breakpoint: self.breakpoints().contains(&line_no),
                highlight,
            });
        }
        SourceWindow {
            start_line: start,
            end_line: end,
            lines,
            more: end < line_count,
        }
    }

    /// All watches sorted by index, with the in-flight change of the cell
    /// the pointer sits on.
    #[must_use]
    pub fn watch_list(&self) -> Vec<WatchEntry> {
        let ptr = self.pointer();
        let pending = self.vm().last_applied_write();
        self.watches()
            .iter()
            .map(|(&index, name)| WatchEntry {
                name: name.clone(),
                index,
                value: self.tape_cell(index).unwrap_or(0),
                pending_change: if index == ptr { pending } else { None },
            })
            .collect()
    }
}
