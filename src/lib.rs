//! # Introduction
//!
//! crepl is an incremental C REPL: every accepted line is merged into a
//! growing translation unit, the unit is handed to the system C toolchain,
//! and the produced program is run.  No C is parsed or interpreted in
//! process; the compiler is the only authority on meaning.
//!
//! ## Evaluation pipeline
//!
//! ```text
//! Line -> Classifier -> Program (display + compile variants) -> Toolchain -> Run
//!              |
//!              +-> VarTable -> print block spliced into the compile variant
//! ```
//!
//! 1. [`repl`] reads lines, dispatches `;` commands, and owns the session.
//! 2. [`program`] keeps the two renditions of the translation unit and the
//!    undo history over their segments.
//! 3. [`vars`] finds assignment targets lexically and classifies them so
//!    their values can be printed after each run.
//! 4. [`compile`] pipes the compile variant to the toolchain and runs the
//!    produced binary.
//! 5. [`buffer`], [`opts`], [`complete`], [`errors`] carry the plumbing:
//!    bounded text regions, flag parsing, completion candidates, and the
//!    error taxonomy.

pub mod buffer;
pub mod compile;
pub mod complete;
pub mod errors;
pub mod opts;
pub mod program;
pub mod repl;
pub mod vars;
