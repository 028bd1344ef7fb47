//! Variable discovery and type classification
//!
//! After every accepted source line the session wants to know which objects
//! the line brought into existence so it can print their values after the
//! next run.  That takes two passes over the raw statement text:
//!
//! 1. [`extract_identifiers`] scans left to right for assignment targets:
//!    an identifier counts when it sits on a non-alphanumeric boundary and
//!    is followed, past a short run of operator characters, by `=` or a
//!    shift-assignment shape.  References on the right-hand side (`&a`) are
//!    never reported.
//! 2. [`extract_type`] anchors a type-specifier keyword before the first
//!    occurrence of the identifier and classifies the captured declarator
//!    span by substring precedence.
//!
//! Classification is lexical and stateless per statement.  It is knowingly
//! coarse: `char wark[]` lands on [`TypeClass::Pointer`] because the span
//! carries a `[` but no `char *`, and a `struct { int *m; }` declarator
//! classifies every variable it declares as a pointer because the member's
//! `*` sits inside the span.  An identifier with no resolvable keyword gets
//! [`TypeClass::Error`]: a stderr diagnostic, never a table entry.

use regex::Regex;

/// Coarse lexical type of a tracked variable, selected by the precedence
/// order of [`classify_span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// No type keyword anchors the identifier; diagnostic only
    Error,
    Char,
    String,
    SignedInt,
    UnsignedInt,
    Double,
    LongDouble,
    Pointer,
    /// Aggregate or otherwise unprintable object
    Other,
}

/// Type-specifier keywords recognised as declarator anchors.
const TYPE_KEYWORDS: &str =
    "bool|_Bool|_Complex|_Imaginary|struct|union|char|double|float|int|long|short|unsigned|void";

/// Classify `id` within `stmt` by capturing its declarator span.
///
/// The span runs from the anchoring keyword up to the identifier, plus any
/// `[` characters that immediately follow it.  A keyword anchors when the
/// statement starts with it or when it is preceded by a blank, `(`, `{` or
/// `;`; the first occurrence of the identifier after the keyword ends the
/// span.
pub fn extract_type(stmt: &str, id: &str) -> TypeClass {
    let pattern = format!(
        r"(?:^|.*[[:blank:]({{;]+)({kw})(.*?[^[:alnum:]_]){id}(\[*)",
        kw = TYPE_KEYWORDS,
        id = regex::escape(id)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return TypeClass::Error,
    };
    let caps = match re.captures(stmt) {
        Some(caps) => caps,
        None => return TypeClass::Error,
    };
    let (kw, gap) = match (caps.get(1), caps.get(2)) {
        (Some(kw), Some(gap)) => (kw, gap),
        _ => return TypeClass::Error,
    };
    let mut span = stmt[kw.start()..gap.end()].to_string();
    if let Some(brackets) = caps.get(3) {
        span.push_str(brackets.as_str());
    }
    classify_span(&span)
}

/// Substring precedence over a captured declarator span; first match wins.
fn classify_span(span: &str) -> TypeClass {
    if span.contains("char *") {
        return TypeClass::String;
    }
    if span.contains('*') || span.contains('[') {
        return TypeClass::Pointer;
    }
    if span.contains("char") {
        return TypeClass::Char;
    }
    if span.contains("long double") {
        return TypeClass::LongDouble;
    }
    if span.contains("float") || span.contains("double") {
        return TypeClass::Double;
    }
    if span.contains("unsigned") {
        return TypeClass::UnsignedInt;
    }
    if ["bool", "_Bool", "short", "int", "long"]
        .iter()
        .any(|kw| span.contains(kw))
    {
        return TypeClass::SignedInt;
    }
    TypeClass::Other
}

/// Collect assignment-target identifiers from `stmt`, left to right.
pub fn extract_identifiers(stmt: &str) -> Vec<String> {
    let bytes = stmt.as_bytes();
    let mut out = Vec::new();
    // A target needs a preceding boundary byte, so offset 0 never starts one.
    let mut i = 1;
    while i < bytes.len() {
        let starts_ident = bytes[i].is_ascii_alphabetic() || bytes[i] == b'_';
        if !starts_ident || bytes[i - 1].is_ascii_alphanumeric() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        if followed_by_assignment(&bytes[i..]) {
            out.push(stmt[start..i].to_string());
        }
    }
    out
}

/// After an identifier, skip a run of operator bytes (anything that is not
/// alphanumeric, `=`, `!`, `<` or `>`) and accept `=`, `<<` or `>>`.  The
/// two-character shapes cover the shift-assignment operators.
fn followed_by_assignment(rest: &[u8]) -> bool {
    let mut j = 0;
    while j < rest.len()
        && !rest[j].is_ascii_alphanumeric()
        && !matches!(rest[j], b'=' | b'!' | b'<' | b'>')
    {
        j += 1;
    }
    match rest.get(j) {
        Some(b'=') => true,
        Some(b'<') => rest.get(j + 1) == Some(&b'<'),
        Some(b'>') => rest.get(j + 1) == Some(&b'>'),
        _ => false,
    }
}

/// One tracked variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarEntry {
    pub id: String,
    pub class: TypeClass,
}

/// Insertion-ordered table of tracked variables.
///
/// Entries are unique by exact `(id, class)` pair; re-declaring a name with
/// a different class adds a second entry rather than replacing the first.
/// The table caches the generated print block and regenerates it lazily
/// whenever registration or replay dirtied the entries.
#[derive(Debug, Default)]
pub struct VarTable {
    entries: Vec<VarEntry>,
    print_block: String,
    dirty: bool,
}

impl VarTable {
    pub fn new() -> Self {
        VarTable::default()
    }

    pub fn entries(&self) -> &[VarEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every classifiable assignment target in `stmt`.
    ///
    /// Returns the number of entries that were new to the table.
    pub fn find_and_register(&mut self, stmt: &str) -> usize {
        let mut added = 0;
        for id in extract_identifiers(stmt) {
            match extract_type(stmt, &id) {
                TypeClass::Error => {
                    eprintln!("crepl: no type found for identifier '{}'", id);
                }
                class => {
                    let known = self
                        .entries
                        .iter()
                        .rev()
                        .any(|e| e.id == id && e.class == class);
                    if !known {
                        self.entries.push(VarEntry { id, class });
                        added += 1;
                    }
                }
            }
        }
        if added > 0 {
            self.dirty = true;
        }
        added
    }

    /// Rebuild the table from scratch over the retained body lines.
    pub fn replay<'a, I>(&mut self, stmts: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.entries.clear();
        self.dirty = true;
        for stmt in stmts {
            self.find_and_register(stmt);
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.print_block.clear();
        self.dirty = false;
    }

    /// The print statements to splice before the closing boilerplate,
    /// regenerated if the entries changed since the last call.
    pub fn print_block(&mut self) -> &str {
        if self.dirty {
            self.print_block = render_print_block(&self.entries);
            self.dirty = false;
        }
        &self.print_block
    }
}

fn render_print_block(entries: &[VarEntry]) -> String {
    let mut out = String::new();
    for e in entries {
        let stmt = match e.class {
            TypeClass::Error => continue,
            TypeClass::Char => {
                format!("\tprintf(\"{id} = %c\\n\", {id});\n", id = e.id)
            }
            TypeClass::String => {
                format!("\tprintf(\"{id} = \\\"%s\\\"\\n\", {id});\n", id = e.id)
            }
            TypeClass::SignedInt => {
                format!("\tprintf(\"{id} = %lld\\n\", (long long){id});\n", id = e.id)
            }
            TypeClass::UnsignedInt => format!(
                "\tprintf(\"{id} = %llu\\n\", (unsigned long long){id});\n",
                id = e.id
            ),
            TypeClass::Double => {
                format!("\tprintf(\"{id} = %f\\n\", (double){id});\n", id = e.id)
            }
            TypeClass::LongDouble => {
                format!("\tprintf(\"{id} = %Lf\\n\", (long double){id});\n", id = e.id)
            }
            TypeClass::Pointer => {
                format!("\tprintf(\"{id} = %p\\n\", (void *){id});\n", id = e.id)
            }
            TypeClass::Other => {
                format!("\tprintf(\"{id} = %p\\n\", (void *)&{id});\n", id = e.id)
            }
        };
        out.push_str(&stmt);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_require_a_boundary() {
        // no preceding byte, so nothing is reported
        assert!(extract_identifiers("a = 5").is_empty());
        assert_eq!(extract_identifiers("int a = 5"), vec!["a"]);
    }

    #[test]
    fn references_are_not_targets() {
        let ids = extract_identifiers("int a = 0, b = 0,*c = &a, *d = &b;");
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn shift_assignment_counts() {
        assert_eq!(extract_identifiers("\tx <<= 2;"), vec!["x"]);
        assert_eq!(extract_identifiers("\ty >>= 1;"), vec!["y"]);
    }

    #[test]
    fn compound_assignment_counts() {
        assert_eq!(extract_identifiers(" total += 4;"), vec!["total"]);
    }

    #[test]
    fn plain_reference_is_ignored() {
        assert!(extract_identifiers("printf(\"%d\", a);").is_empty());
    }

    #[test]
    fn missing_keyword_is_an_error() {
        assert_eq!(extract_type("x = (y)z", "x"), TypeClass::Error);
    }

    #[test]
    fn duplicate_pairs_register_once() {
        let mut table = VarTable::new();
        assert_eq!(table.find_and_register("int x = 5;"), 1);
        assert_eq!(table.find_and_register("int x = 6;"), 0);
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn print_block_regenerates_after_replay() {
        let mut table = VarTable::new();
        table.find_and_register("int x = 5;");
        assert!(table.print_block().contains("(long long)x"));
        table.replay(std::iter::empty());
        assert_eq!(table.print_block(), "");
    }
}
