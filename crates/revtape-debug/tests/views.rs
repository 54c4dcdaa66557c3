//! View helpers: memory rows, source windows, watch table.

use revtape_core::{parse, InputStream, OutputStream, Vm};
use revtape_debug::{Debugger, Direction, MarkKind};

fn debugger(source: &str) -> Debugger {
    Debugger::new(source, InputStream::default(), OutputStream::sink()).unwrap()
}

fn small(source: &str, tape_len: usize) -> Debugger {
    Debugger::from_vm(Vm::with_tape_len(
        parse(source).unwrap(),
        InputStream::default(),
        OutputStream::sink(),
        tape_len,
    ))
}

#[test]
fn memory_window_marks_pointer_and_watches() {
    let mut dbg = debugger("+");
    dbg.add_watch("w", 3).unwrap();

    let window = dbg.memory_window(Some(0), 8, 1);
    assert_eq!(window.rows.len(), 1);
    let row = &window.rows[0];
    assert_eq!(row.base, 0);
    assert_eq!(row.cells.len(), 8);
    assert_eq!(row.marks.len(), 2);
    assert_eq!(row.marks[0].offset, 0);
    assert_eq!(row.marks[0].kind, MarkKind::Pointer);
    assert_eq!(row.marks[1].offset, 3);
    assert_eq!(row.marks[1].kind, MarkKind::Watch);
    assert!(window.more);
}

#[test]
fn memory_window_merges_pointer_and_watch_marks() {
    let mut dbg = debugger(">>");
    dbg.add_watch("w", 2).unwrap();
    assert!(!dbg.run(Direction::Forward).unwrap());

    let window = dbg.memory_window(Some(0), 4, 1);
    let row = &window.rows[0];
    assert_eq!(row.marks.len(), 1);
    assert_eq!(row.marks[0].offset, 2);
    assert_eq!(row.marks[0].kind, MarkKind::PointerWatch);
}

#[test]
fn memory_window_aligns_to_the_pointer_by_default() {
    let mut dbg = debugger("+");
    dbg.vm_mut().set_pointer(13).unwrap();

    let window = dbg.memory_window(None, 10, 1);
    let row = &window.rows[0];
    assert_eq!(row.base, 10);
    assert_eq!(row.marks[0].offset, 3);
    assert_eq!(row.marks[0].kind, MarkKind::Pointer);
}

#[test]
fn memory_window_clamps_at_the_tape_end() {
    let dbg = small("+", 16);
    let window = dbg.memory_window(Some(0), 10, 4);
    assert_eq!(window.rows.len(), 2);
    assert_eq!(window.rows[0].cells.len(), 10);
    assert_eq!(window.rows[1].cells.len(), 6);
    assert!(!window.more);
}

#[test]
fn memory_window_reflects_executed_writes() {
    let mut dbg = debugger("+++>++");
    assert!(!dbg.run(Direction::Forward).unwrap());
    let window = dbg.memory_window(Some(0), 4, 1);
    assert_eq!(&window.rows[0].cells[..2], &[3, 2]);
}

#[test]
fn source_window_centres_on_the_requested_line() {
    let dbg = debugger("+\n+\n+\n+\n+\n+\n");
    let window = dbg.source_window(Some(3), 3);
    assert_eq!((window.start_line, window.end_line), (2, 5));
    assert_eq!(window.lines.len(), 3);
    assert_eq!(window.lines[0].line_no, 2);
    assert!(window.more);
}

#[test]
fn source_window_pushes_off_the_top_edge() {
    let dbg = debugger("+\n+\n+\n+\n+\n+\n");
    let window = dbg.source_window(Some(0), 5);
    assert_eq!((window.start_line, window.end_line), (0, 5));
}

#[test]
fn source_window_pulls_in_at_the_bottom_edge() {
    // Six instruction lines plus the empty trailing line: seven in all.
    let dbg = debugger("+\n+\n+\n+\n+\n+\n");
    let window = dbg.source_window(Some(6), 4);
    assert_eq!((window.start_line, window.end_line), (3, 7));
    assert!(!window.more);
}

#[test]
fn source_window_highlights_the_current_command_span() {
    let mut dbg = debugger("++[->+<]");
    let window = dbg.source_window(None, 10);
    assert_eq!(window.lines.len(), 1);
    assert_eq!(window.lines[0].text, "++[->+<]");
    // The coalesced `++` run about to execute spans columns 0..2.
    assert_eq!(window.lines[0].highlight, Some((0, 2)));

    assert!(dbg.step(Direction::Forward).unwrap());
    let window = dbg.source_window(None, 10);
    assert_eq!(window.lines[0].highlight, Some((2, 3)));
}

#[test]
fn source_window_follows_the_current_line() {
    let mut dbg = debugger("+\n+\n+\n");
    assert!(dbg.next_line(Direction::Forward).unwrap());
    let window = dbg.source_window(None, 1);
    assert_eq!(window.lines.len(), 1);
    assert_eq!(window.lines[0].line_no, 1);
    assert_eq!(window.lines[0].highlight, Some((0, 1)));
}

#[test]
fn source_window_marks_breakpoint_lines() {
    let mut dbg = debugger("+\n+\n+\n");
    dbg.add_breakpoint(1).unwrap();
    let window = dbg.source_window(Some(1), 3);
    let marked: Vec<u32> = window
        .lines
        .iter()
        .filter(|l| l.is_breakpoint)
        .map(|l| l.line_no)
        .collect();
    assert_eq!(marked, vec![1]);
}

#[test]
fn watch_list_is_sorted_by_index() {
    let mut dbg = debugger("+");
    dbg.add_watch("high", 9).unwrap();
    dbg.add_watch("low", 2).unwrap();

    let watches = dbg.watch_list();
    assert_eq!(watches.len(), 2);
    assert_eq!((watches[0].index, watches[0].name.as_str()), (2, "low"));
    assert_eq!((watches[1].index, watches[1].name.as_str()), (9, "high"));
    assert_eq!(watches[0].pending_change, None);
}

#[test]
fn watch_list_shows_the_in_flight_change_only_under_the_pointer() {
    let mut dbg = debugger("+++>+");
    dbg.add_watch("a", 0).unwrap();
    dbg.add_watch("b", 1).unwrap();
    assert!(dbg.run(Direction::Forward).unwrap());

    // Stopped after the first write: cell 0 went 0 -> 3.
    let watches = dbg.watch_list();
    assert_eq!(watches[0].pending_change, Some((0, 3)));
    assert_eq!(watches[0].value, 3);
    assert_eq!(watches[1].pending_change, None);
}
