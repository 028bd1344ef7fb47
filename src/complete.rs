//! Completion lexicon for the line editor
//!
//! A static word list (C keywords, common libc names, the `;` commands)
//! merged with the identifiers the session has registered so far.  The
//! shared identifier list is refreshed by the session after each line.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashSet;
use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// Static completion candidates.
pub const WORD_LIST: &[&str] = &[
    // keywords and type names
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary",
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "ssize_t", "ptrdiff_t", "intptr_t", "uintptr_t", "NULL", "true", "false",
    // common libc names
    "abort", "abs", "atof", "atoi", "atol", "calloc", "exit", "fclose", "fgets", "fopen",
    "fprintf", "fputs", "fread", "free", "fscanf", "fwrite", "getchar", "getenv", "isalnum",
    "isalpha", "isdigit", "isspace", "malloc", "memcmp", "memcpy", "memmove", "memset",
    "printf", "putchar", "puts", "qsort", "rand", "realloc", "scanf", "snprintf", "sprintf",
    "sscanf", "strcat", "strchr", "strcmp", "strcpy", "strdup", "strlen", "strncmp", "strncpy",
    "strstr", "strtod", "strtol", "time", "tolower", "toupper",
    // session commands
    ";att", ";function", ";help", ";intel", ";macro", ";output", ";parse", ";quit", ";reset",
    ";tracking", ";undo", ";warnings",
];

/// Rustyline helper offering the lexicon plus session identifiers.
pub struct LexiconHelper {
    identifiers: Arc<Mutex<Vec<String>>>,
}

impl LexiconHelper {
    pub fn new(identifiers: Arc<Mutex<Vec<String>>>) -> Self {
        LexiconHelper { identifiers }
    }
}

/// Byte offset where the word under the cursor starts.  `;` counts as a
/// word character so the session commands complete.
fn word_start(line: &str, pos: usize) -> usize {
    match line[..pos].rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != ';') {
        Some(i) => i + line[i..].chars().next().map_or(1, char::len_utf8),
        None => 0,
    }
}

impl Completer for LexiconHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let start = word_start(line, pos);
        let prefix = &line[start..pos];
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut candidates = Vec::new();
        for word in WORD_LIST.iter().copied() {
            if word.starts_with(prefix) && seen.insert(word.to_string()) {
                candidates.push(word.to_string());
            }
        }
        if let Ok(identifiers) = self.identifiers.lock() {
            for id in identifiers.iter() {
                if id.starts_with(prefix) && seen.insert(id.clone()) {
                    candidates.push(id.clone());
                }
            }
        }
        Ok((start, candidates))
    }
}

impl Hinter for LexiconHelper {
    type Hint = String;
}

impl Highlighter for LexiconHelper {}

impl Validator for LexiconHelper {}

impl Helper for LexiconHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_start_stops_at_boundaries() {
        assert_eq!(word_start("int pri", 7), 4);
        assert_eq!(word_start(";he", 3), 0);
        assert_eq!(word_start("x = ma", 6), 4);
    }
}
