//! The dual-buffer program model
//!
//! The session keeps two renditions of the translation unit in lockstep:
//!
//! * the **display** variant, shown to the user, with a bare `main` and no
//!   prelude, and
//! * the **compile** variant, handed to the toolchain, with the full header
//!   prelude and the variable print block spliced in before the closing
//!   boilerplate.
//!
//! Each variant owns three segments (preamble, body, total) plus a history
//! stack recording, per accepted line, which segment received it and how
//! long that segment was beforehand.  Undo truncates the tagged segment back
//! to the recorded length.  Entries tagged [`LineFlag::Empty`] record no-op
//! submissions and are never popped, so an undo that reaches one stops
//! there.

use crate::buffer::TextBuffer;
use crate::errors::ReplError;

/// Headers and feature macros prepended to the compile variant.
pub const PRELUDE: &str = "#define _GNU_SOURCE\n\n\
#include <assert.h>\n\
#include <ctype.h>\n\
#include <errno.h>\n\
#include <float.h>\n\
#include <limits.h>\n\
#include <math.h>\n\
#include <stdbool.h>\n\
#include <stddef.h>\n\
#include <stdint.h>\n\
#include <stdio.h>\n\
#include <stdlib.h>\n\
#include <string.h>\n\
#include <time.h>\n\
#include <unistd.h>\n";

/// Opening boilerplate of the compile variant's `main`.
pub const PROG_START: &str = "\nint main(int argc, char **argv)\n{\n\t(void)argc, (void)argv;\n";

/// Opening boilerplate of the display variant's `main`.
pub const PROG_START_USER: &str = "\nint main(int argc, char **argv)\n{\n";

/// Closing boilerplate shared by both variants.
pub const PROG_END: &str = "\n\treturn 0;\n}\n";

/// Which segment a history entry touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFlag {
    /// Preamble: directives and explicit definitions
    TopLevel,
    /// Body of `main`
    Body,
    /// No-op entry; never popped by undo
    Empty,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    line: String,
    flag: LineFlag,
    /// Length of the receiving segment before the append
    saved_len: usize,
}

/// One rendition of the translation unit.
#[derive(Debug)]
pub struct SourceVariant {
    pub preamble: TextBuffer,
    pub body: TextBuffer,
    pub total: TextBuffer,
    history: Vec<HistoryEntry>,
}

impl SourceVariant {
    fn new(preamble_init: &str, body_init: &str) -> Result<Self, ReplError> {
        let mut preamble = TextBuffer::new();
        preamble.append(preamble_init)?;
        let mut body = TextBuffer::new();
        body.append(body_init)?;
        Ok(SourceVariant {
            preamble,
            body,
            total: TextBuffer::new(),
            history: Vec::new(),
        })
    }

    fn push(&mut self, line: &str, flag: LineFlag, rendered: &str) -> Result<(), ReplError> {
        let (saved_len, segment) = match flag {
            LineFlag::TopLevel => (self.preamble.len(), &mut self.preamble),
            LineFlag::Body => (self.body.len(), &mut self.body),
            LineFlag::Empty => {
                self.history.push(HistoryEntry {
                    line: line.to_string(),
                    flag,
                    saved_len: 0,
                });
                return Ok(());
            }
        };
        segment.append(rendered)?;
        self.history.push(HistoryEntry {
            line: line.to_string(),
            flag,
            saved_len,
        });
        Ok(())
    }

    fn pop(&mut self) -> bool {
        match self.history.last() {
            None => false,
            Some(entry) if entry.flag == LineFlag::Empty => false,
            Some(_) => {
                let entry = match self.history.pop() {
                    Some(entry) => entry,
                    None => return false,
                };
                match entry.flag {
                    LineFlag::TopLevel => self.preamble.truncate(entry.saved_len),
                    LineFlag::Body => self.body.truncate(entry.saved_len),
                    LineFlag::Empty => {}
                }
                true
            }
        }
    }

    fn rebuild_total(&mut self, spliced: Option<&str>) -> Result<(), ReplError> {
        self.total.reset();
        self.total.append(self.preamble.as_str())?;
        self.total.append(self.body.as_str())?;
        if let Some(block) = spliced {
            if !block.is_empty() {
                self.total.append(block)?;
            }
        }
        self.total.append(PROG_END)
    }

    /// Raw lines of every retained body entry, oldest first.
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.history
            .iter()
            .filter(|e| e.flag == LineFlag::Body)
            .map(|e| e.line.as_str())
    }

    /// Number of recorded submissions, no-ops included.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// The display and compile renditions, kept in lockstep.
#[derive(Debug)]
pub struct Program {
    pub display: SourceVariant,
    pub compile: SourceVariant,
}

impl Program {
    pub fn new() -> Result<Self, ReplError> {
        Ok(Program {
            display: SourceVariant::new("", PROG_START_USER)?,
            compile: SourceVariant::new(PRELUDE, PROG_START)?,
        })
    }

    /// Reinitialise both variants, their histories and boilerplate.
    pub fn reset(&mut self) -> Result<(), ReplError> {
        *self = Program::new()?;
        Ok(())
    }

    /// Classify `raw` and append it to both variants.
    ///
    /// Trailing whitespace is dropped and doubled `;;` squeezed first.  A
    /// line starting with `#` is kept verbatim in the preamble; anything
    /// else is tab-indented into the body, gaining a `;` unless it already
    /// ends in `{`, `}`, `;` or `\`.  A line that is empty after trimming
    /// records an `Empty` history entry and changes no segment.
    pub fn submit(&mut self, raw: &str) -> Result<(), ReplError> {
        let line = prepare(raw);
        if line.is_empty() {
            self.display.push(&line, LineFlag::Empty, "")?;
            return self.compile.push(&line, LineFlag::Empty, "");
        }
        if line.starts_with('#') {
            let rendered = format!("{}\n", line);
            self.display.push(&line, LineFlag::TopLevel, &rendered)?;
            return self.compile.push(&line, LineFlag::TopLevel, &rendered);
        }
        let rendered = format!("\t{}{}\n", line, terminator(&line));
        self.display.push(&line, LineFlag::Body, &rendered)?;
        self.compile.push(&line, LineFlag::Body, &rendered)
    }

    /// Append a function or macro definition to the preamble of both
    /// variants (the `;f` and `;m` commands).  The text is kept as given,
    /// without the terminator a body line would gain.
    pub fn submit_definition(&mut self, raw: &str) -> Result<(), ReplError> {
        let line = prepare(raw);
        if line.is_empty() {
            self.display.push(&line, LineFlag::Empty, "")?;
            return self.compile.push(&line, LineFlag::Empty, "");
        }
        let rendered = format!("{}\n", line);
        self.display.push(&line, LineFlag::TopLevel, &rendered)?;
        self.compile.push(&line, LineFlag::TopLevel, &rendered)
    }

    /// Drop the most recent line from both variants.
    ///
    /// Returns false when the history is empty or the top entry is a no-op,
    /// in which case nothing changes.
    pub fn undo(&mut self) -> bool {
        let display = self.display.pop();
        let compile = self.compile.pop();
        debug_assert_eq!(display, compile, "variant histories out of lockstep");
        display && compile
    }

    /// Reassemble both totals; `print_block` is spliced into the compile
    /// variant only, immediately before the closing boilerplate.
    pub fn rebuild(&mut self, print_block: Option<&str>) -> Result<(), ReplError> {
        self.display.rebuild_total(None)?;
        self.compile.rebuild_total(print_block)
    }

    /// Raw lines of every retained body entry, oldest first.
    pub fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.compile.body_lines()
    }
}

fn prepare(raw: &str) -> String {
    let mut line = raw.trim().to_string();
    while line.ends_with(";;") {
        line.pop();
    }
    line
}

fn terminator(line: &str) -> &'static str {
    if line.ends_with(['{', '}', ';', '\\']) {
        ""
    } else {
        ";"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_lines_are_indented_and_terminated() {
        let mut program = Program::new().expect("init");
        program.submit("int x = 5").expect("submit");
        assert!(program.display.body.as_str().ends_with("\tint x = 5;\n"));
        assert!(program.compile.body.as_str().ends_with("\tint x = 5;\n"));
    }

    #[test]
    fn delimited_lines_keep_their_ending() {
        let mut program = Program::new().expect("init");
        program.submit("for (int i = 0; i < 3; i++) {").expect("submit");
        program.submit("}").expect("submit");
        let body = program.display.body.as_str();
        assert!(body.contains("\tfor (int i = 0; i < 3; i++) {\n"));
        assert!(body.ends_with("\t}\n"));
    }

    #[test]
    fn doubled_semicolons_are_squeezed() {
        let mut program = Program::new().expect("init");
        program.submit("puts(\"hi\");;").expect("submit");
        assert!(program.display.body.as_str().ends_with("\tputs(\"hi\");\n"));
    }

    #[test]
    fn directives_go_to_the_preamble() {
        let mut program = Program::new().expect("init");
        program.submit("#include <regex.h>").expect("submit");
        assert!(program.display.preamble.as_str().contains("#include <regex.h>\n"));
        assert!(!program.display.body.as_str().contains("regex.h"));
    }

    #[test]
    fn definitions_go_to_the_preamble() {
        let mut program = Program::new().expect("init");
        program
            .submit_definition("int square(int n) { return n * n; }")
            .expect("submit");
        assert!(program
            .compile
            .preamble
            .as_str()
            .ends_with("int square(int n) { return n * n; }\n"));
    }

    #[test]
    fn undo_restores_byte_identical_totals() {
        let mut program = Program::new().expect("init");
        program.submit("int a = 1").expect("submit");
        program.rebuild(None).expect("rebuild");
        let display_before = program.display.total.as_str().to_string();
        let compile_before = program.compile.total.as_str().to_string();

        program.submit("int b = 2").expect("submit");
        program.rebuild(None).expect("rebuild");
        assert_ne!(program.display.total.as_str(), display_before);

        assert!(program.undo());
        program.rebuild(None).expect("rebuild");
        assert_eq!(program.display.total.as_str(), display_before);
        assert_eq!(program.compile.total.as_str(), compile_before);
    }

    #[test]
    fn undo_on_fresh_program_is_a_noop() {
        let mut program = Program::new().expect("init");
        assert!(!program.undo());
        assert_eq!(program.display.history_len(), 0);
    }

    #[test]
    fn reset_clears_the_histories() {
        let mut program = Program::new().expect("init");
        program.submit("int a = 1").expect("submit");
        program.submit("int b = 2").expect("submit");
        program.reset().expect("reset");
        assert_eq!(program.display.history_len(), 0);
        assert_eq!(program.compile.history_len(), 0);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut program = Program::new().expect("init");
        program.submit("int a = 1").expect("submit");
        program.rebuild(None).expect("rebuild");
        let first = program.compile.total.as_str().to_string();
        program.rebuild(None).expect("rebuild");
        assert_eq!(program.compile.total.as_str(), first);
    }

    #[test]
    fn empty_submission_blocks_undo() {
        let mut program = Program::new().expect("init");
        program.submit("int a = 1").expect("submit");
        program.submit("   ").expect("submit");
        // the no-op entry sits on top and is never popped
        assert!(!program.undo());
        assert!(program.display.body.as_str().contains("int a = 1;"));
    }

    #[test]
    fn totals_follow_the_segment_order() {
        let mut program = Program::new().expect("init");
        program.submit("#define N 3").expect("submit");
        program.submit("int x = N").expect("submit");
        program.rebuild(Some("\tprintf(\"x = %d\\n\", x);\n")).expect("rebuild");

        let compile = program.compile.total.as_str();
        let directive = compile.find("#define N 3").expect("directive present");
        let body = compile.find("\tint x = N;").expect("body present");
        let splice = compile.find("printf(\"x = %d").expect("splice present");
        let end = compile.find(PROG_END).expect("closing boilerplate present");
        assert!(directive < body && body < splice && splice < end);

        // the display variant never sees the splice
        assert!(!program.display.total.as_str().contains("printf(\"x ="));
    }

    #[test]
    fn body_lines_reports_retained_lines_in_order() {
        let mut program = Program::new().expect("init");
        program.submit("int a = 1").expect("submit");
        program.submit("#define M 2").expect("submit");
        program.submit("int b = M").expect("submit");
        program.undo();
        let lines: Vec<&str> = program.body_lines().collect();
        assert_eq!(lines, vec!["int a = 1"]);
    }
}
