// crates/revtape-core/src/parser.rs

//! Source text → command graph.
//!
//! The parser recognises the eight instructions, coalesces runs of `+`/`-`
//! and `<`/`>` into single commands, and nests `[` … `]` recursively.
//! `;`, `#`, and `//` begin a comment running to the next newline; every
//! other byte is a no-op that still participates in newline counting.

use crate::errors::ParseError;
use crate::pos::SourcePos;
use crate::program::{Command, CommandKind, CommandRef, Program};

/// Parse `source` into an executable [`Program`].
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).run()
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    cmds: Vec<Command>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 0,
            cmds: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Program, ParseError> {
        let top = self.seq(None)?;

        let src_len = self.bytes.len() as u32;
        let end = self.alloc(
            CommandKind::End,
            SourcePos::new(self.line, src_len, src_len),
            None,
        );
        let init = self.alloc(CommandKind::Init, SourcePos::new(0, 0, 0), None);

        let entry = top.first().copied().unwrap_or(end);
        self.cmds[init.index()].next = Some(entry);
        if let Some(&last) = top.last() {
            self.cmds[last.index()].next = Some(end);
        }

        Ok(Program {
            cmds: self.cmds,
            init,
            end,
            top,
            source: self.src.to_owned(),
            line_starts: line_starts(self.src),
        })
    }

    fn alloc(&mut self, kind: CommandKind, span: SourcePos, parent: Option<CommandRef>) -> CommandRef {
        let r = CommandRef(self.cmds.len() as u32);
        self.cmds.push(Command {
            kind,
            span,
            parent,
            next: None,
        });
        r
    }

    /// Parse a command sequence until an unconsumed `]`, or end of input.
    /// Inside a loop the caller consumes the bracket; at the top level a
    /// stray `]` is an error.
    fn seq(&mut self, parent: Option<CommandRef>) -> Result<Vec<CommandRef>, ParseError> {
        let mut out = Vec::new();
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'.' => {
                    let r = self.alloc(
                        CommandKind::Write,
                        SourcePos::at(self.line, self.pos as u32),
                        parent,
                    );
                    self.pos += 1;
                    self.push_linked(&mut out, r);
                }
                b',' => {
                    let r = self.alloc(
                        CommandKind::Read,
                        SourcePos::at(self.line, self.pos as u32),
                        parent,
                    );
                    self.pos += 1;
                    self.push_linked(&mut out, r);
                }
                b'+' | b'-' => {
                    let (delta, span) = self.coalesce(b'+', b'-');
                    if delta != 0 {
                        let r = self.alloc(CommandKind::Add { delta }, span, parent);
                        self.push_linked(&mut out, r);
                    }
                }
                b'<' | b'>' => {
                    let (delta, span) = self.coalesce(b'>', b'<');
                    if delta != 0 {
                        let r = self.alloc(CommandKind::Move { delta }, span, parent);
                        self.push_linked(&mut out, r);
                    }
                }
                b'[' => {
                    let open = SourcePos::at(self.line, self.pos as u32);
                    self.pos += 1;
                    // Allocate the loop first so body commands can name it
                    // as their parent.
                    let r = self.alloc(CommandKind::Loop { body: Vec::new() }, open, parent);
                    let body = self.seq(Some(r))?;
                    if self.pos >= self.bytes.len() {
                        return Err(ParseError::UnmatchedOpen(open));
                    }
                    self.pos += 1; // the `]`
                    if let Some(&last) = body.last() {
                        self.cmds[last.index()].next = Some(r);
                    }
                    if let CommandKind::Loop { body: slot } = &mut self.cmds[r.index()].kind {
                        *slot = body;
                    }
                    self.push_linked(&mut out, r);
                }
                b']' => {
                    if parent.is_none() {
                        return Err(ParseError::UnmatchedClose(SourcePos::at(
                            self.line,
                            self.pos as u32,
                        )));
                    }
                    return Ok(out);
                }
                b';' | b'#' => self.comment()?,
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'/') => self.comment()?,
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Ok(out)
    }

    fn push_linked(&mut self, out: &mut Vec<CommandRef>, r: CommandRef) {
        if let Some(&prev) = out.last() {
            self.cmds[prev.index()].next = Some(r);
        }
        out.push(r);
    }

    /// Consume a contiguous run of `plus`/`minus` characters, returning the
    /// signed sum and the span covering the whole run. The terminating
    /// newline (or any other byte) stays for the main loop.
    fn coalesce(&mut self, plus: u8, minus: u8) -> (i32, SourcePos) {
        let start = self.pos;
        let line = self.line;
        let mut delta = 0i32;
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == plus {
                delta += 1;
            } else if c == minus {
                delta -= 1;
            } else {
                break;
            }
            self.pos += 1;
        }
        (delta, SourcePos::new(line, start as u32, self.pos as u32))
    }

    /// Skip a comment up to (but not including) its terminating newline, so
    /// the main loop still counts it. EOF before the newline is an error.
    fn comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let line = self.line;
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == b'\n' {
                return Ok(());
            }
            self.pos += 1;
        }
        Err(ParseError::UnterminatedComment(SourcePos::new(
            line,
            start as u32,
            self.pos as u32,
        )))
    }
}

/// Byte offsets at which each source line starts (line 0 starts at 0).
fn line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::CommandKind;

    fn kinds(program: &Program) -> Vec<CommandKind> {
        program
            .top_level()
            .iter()
            .map(|&r| program.get(r).kind.clone())
            .collect()
    }

    #[test]
    fn coalesces_adds_and_moves() {
        let program = parse("+++--<<>>>").unwrap();
        assert_eq!(
            kinds(&program),
            vec![CommandKind::Add { delta: 1 }, CommandKind::Move { delta: 1 }]
        );
    }

    #[test]
    fn zero_delta_runs_are_omitted() {
        let program = parse("+-<>.").unwrap();
        assert_eq!(kinds(&program), vec![CommandKind::Write]);
    }

    #[test]
    fn run_span_covers_the_whole_run() {
        let program = parse("..+++-").unwrap();
        let add = program.top_level()[2];
        let span = program.get(add).span;
        assert_eq!((span.start, span.end), (2, 6));
    }

    #[test]
    fn comments_hide_instructions_and_count_lines() {
        let program = parse("+ ; ignore +++\n# also ignored\n// and this\n-").unwrap();
        assert_eq!(
            kinds(&program),
            vec![CommandKind::Add { delta: 1 }, CommandKind::Add { delta: -1 }]
        );
        let minus = program.top_level()[1];
        assert_eq!(program.get(minus).span.line, 3);
    }

    #[test]
    fn single_slash_is_a_noop() {
        let program = parse("+/+").unwrap();
        // The two runs are separated by the slash, so they stay distinct.
        assert_eq!(
            kinds(&program),
            vec![CommandKind::Add { delta: 1 }, CommandKind::Add { delta: 1 }]
        );
    }

    #[test]
    fn loop_body_links_back_to_the_loop() {
        let program = parse("[+.]").unwrap();
        let lp = program.top_level()[0];
        let CommandKind::Loop { body } = &program.get(lp).kind else {
            panic!("expected a loop");
        };
        assert_eq!(body.len(), 2);
        let last = body[1];
        assert_eq!(program.get(last).next, Some(lp));
        assert_eq!(program.get(last).parent, Some(lp));
        // The loop's own exit is the end sentinel.
        assert_eq!(program.get(lp).next, Some(program.end()));
    }

    #[test]
    fn nested_parents_chain() {
        let program = parse("[[+]]").unwrap();
        let outer = program.top_level()[0];
        let CommandKind::Loop { body } = &program.get(outer).kind else {
            panic!("expected a loop");
        };
        let inner = body[0];
        assert_eq!(program.get(inner).parent, Some(outer));
        let CommandKind::Loop { body: inner_body } = &program.get(inner).kind else {
            panic!("expected a nested loop");
        };
        assert_eq!(program.get(inner_body[0]).parent, Some(inner));
    }

    #[test]
    fn top_level_links_to_end_and_init_to_entry() {
        let program = parse("+.").unwrap();
        let first = program.top_level()[0];
        let second = program.top_level()[1];
        assert_eq!(program.entry(), first);
        assert_eq!(program.get(first).next, Some(second));
        assert_eq!(program.get(second).next, Some(program.end()));
    }

    #[test]
    fn unmatched_close_is_an_error() {
        let err = parse("+]").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedClose(_)));
        assert_eq!(err.span().start, 1);
    }

    #[test]
    fn unmatched_open_is_an_error() {
        let err = parse("[[+]").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedOpen(_)));
        assert_eq!(err.span().start, 0);
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = parse("+ ; no newline after this").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment(_)));
    }

    #[test]
    fn newlines_inside_comments_still_count() {
        let program = parse(";one\n;two\n+").unwrap();
        let add = program.top_level()[0];
        assert_eq!(program.get(add).span.line, 2);
    }
}
