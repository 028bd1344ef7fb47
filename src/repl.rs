//! The interactive session
//!
//! One loop: read a line, dispatch it, show the listing, hand the compile
//! total to the toolchain, run the result.  Lines starting with `;` are
//! session commands; everything else is source.
//!
//! Interrupts are state, not control flow.  At the prompt, Ctrl-C surfaces
//! as [`ReadlineError::Interrupted`] and simply abandons the line.  While a
//! child process runs, the signal handler only flips an atomic flag; the
//! child dies with the signal, the evaluation call returns, and the loop
//! rolls the last submitted line back.  Cleanup (output-file flush, temp
//! binary removal) is idempotent and shared by the quit, EOF and fatal
//! paths; the line history is persisted incrementally instead.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashSet;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::compile;
use crate::complete::LexiconHelper;
use crate::errors::ReplError;
use crate::opts::{self, AsmDialect, Config};
use crate::program::Program;
use crate::vars::VarTable;

const PROMPT: &str = ">>> ";

const HELP: &str = "commands (a line starting with ';'):
	;a <file>	toggle AT&T-dialect assembly output to <file>
	;f <def>	append a function definition to the preamble
	;h		show this help
	;i <file>	toggle Intel-dialect assembly output to <file>
	;m <def>	append a macro definition to the preamble
	;o <file>	toggle mirroring the program text to <file>
	;p		toggle identifier completion
	;q		quit
	;r		reset the program state
	;t		toggle variable tracking
	;u		undo the last line
	;w		toggle compiler warnings
";

enum Flow {
    Continue,
    Quit,
}

/// An interactive session over one growing translation unit.
pub struct Session {
    cfg: Config,
    program: Program,
    vars: VarTable,
    cc_argv: Vec<String>,
    interrupted: Arc<AtomicBool>,
    seen_lines: FxHashSet<String>,
    completion_ids: Arc<Mutex<Vec<String>>>,
    interactive: bool,
    history_path: Option<PathBuf>,
}

impl Session {
    pub fn new(cfg: Config) -> Result<Self, ReplError> {
        let cc_argv = opts::build_cc_argv(&cfg);
        Ok(Session {
            program: Program::new()?,
            vars: VarTable::new(),
            cc_argv,
            interrupted: Arc::new(AtomicBool::new(false)),
            seen_lines: FxHashSet::default(),
            completion_ids: Arc::new(Mutex::new(Vec::new())),
            interactive: std::io::stdin().is_terminal(),
            history_path: history_path(),
            cfg,
        })
    }

    /// Drive the session to completion and report the exit code.
    pub fn run(&mut self) -> Result<i32, ReplError> {
        let interrupted = Arc::clone(&self.interrupted);
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
            eprintln!("crepl: could not install the interrupt handler: {}", e);
        }

        let mut rl: Editor<LexiconHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(LexiconHelper::new(Arc::clone(&self.completion_ids))));
        if let Some(path) = &self.history_path {
            let _ = rl.load_history(path);
        }

        if self.interactive {
            eprintln!("{}", opts::VERSION);
        }

        let mut fatal: Option<ReplError> = None;

        if let Some(seed) = self.cfg.seed_file.take() {
            match self.seed_from_file(&seed) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => fatal = Some(e),
                Err(e) => eprintln!("crepl: {}", e),
            }
        }

        let mut code = 0;
        while fatal.is_none() {
            let prompt = if self.interactive { PROMPT } else { "" };
            let line = match rl.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    // abandon the line, keep the session
                    self.interrupted.store(false, Ordering::SeqCst);
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("crepl: line editor error: {}", e);
                    code = 1;
                    break;
                }
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if self.seen_lines.insert(line.clone()) {
                let _ = rl.add_history_entry(&line);
                if let Some(path) = &self.history_path {
                    let _ = rl.save_history(path);
                }
            }
            match self.dispatch(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) if e.is_fatal() => fatal = Some(e),
                Err(e) => eprintln!("crepl: {}", e),
            }
        }

        if let Some(path) = &self.history_path {
            let _ = rl.save_history(path);
        }
        self.cleanup();
        match fatal {
            Some(e) => Err(e),
            None => Ok(code),
        }
    }

    fn dispatch(&mut self, line: &str) -> Result<Flow, ReplError> {
        if let Some(rest) = line.strip_prefix(';') {
            return self.command(rest);
        }
        self.submit_line(line)?;
        Ok(Flow::Continue)
    }

    fn command(&mut self, rest: &str) -> Result<Flow, ReplError> {
        let (word, arg) = match rest.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (rest, ""),
        };
        // commands dispatch on their first letter, so the long names in the
        // completion lexicon work too
        match word.chars().next() {
            Some('u') => {
                if self.undo_last_line()? {
                    if self.interactive {
                        self.show_listing();
                    }
                } else {
                    eprintln!("crepl: nothing to undo");
                }
            }
            Some('a') => self.toggle_asm(AsmDialect::Att, arg)?,
            Some('i') => self.toggle_asm(AsmDialect::Intel, arg)?,
            Some('o') => self.toggle_output(arg)?,
            Some('p') => self.toggle_parse()?,
            Some('t') => self.toggle_track()?,
            Some('w') => self.toggle_warnings()?,
            Some('r') => {
                self.reset_modes();
                self.reinit()?;
            }
            Some('m') | Some('f') => self.submit_definition(arg)?,
            Some('h') => eprint!("{}", HELP),
            Some('q') => return Ok(Flow::Quit),
            // unknown or bare ';' is a no-op
            _ => {}
        }
        Ok(Flow::Continue)
    }

    fn submit_line(&mut self, line: &str) -> Result<(), ReplError> {
        self.program.submit(line)?;
        if self.cfg.track && self.vars.find_and_register(line) > 0 {
            self.refresh_completion_ids();
        }
        self.after_change()
    }

    fn submit_definition(&mut self, def: &str) -> Result<(), ReplError> {
        if def.is_empty() {
            eprintln!("crepl: nothing to define");
            return Ok(());
        }
        self.program.submit_definition(def)?;
        if self.cfg.track && self.vars.find_and_register(def) > 0 {
            self.refresh_completion_ids();
        }
        self.after_change()
    }

    fn after_change(&mut self) -> Result<(), ReplError> {
        self.rebuild()?;
        if self.interactive {
            self.show_listing();
        }
        self.evaluate()
    }

    fn rebuild(&mut self) -> Result<(), ReplError> {
        if self.cfg.track && !self.vars.is_empty() {
            let block = self.vars.print_block().to_string();
            self.program.rebuild(Some(&block))
        } else {
            self.program.rebuild(None)
        }
    }

    /// Hand the compile total to the toolchain and run the result.
    ///
    /// A rejected translation unit keeps the line; the user can `;u` it.
    /// An interrupt observed during the child run rolls the line back.
    fn evaluate(&mut self) -> Result<(), ReplError> {
        self.interrupted.store(false, Ordering::SeqCst);
        let total = self.program.compile.total.as_str().to_string();
        let result = if self.cfg.asm_file.is_some() {
            compile::dump_asm(&total, &self.cc_argv).map(|()| None)
        } else {
            compile::compile_and_run(&total, &self.cc_argv).map(Some)
        };
        let succeeded = match result {
            Ok(code) => {
                if let Some(code) = code {
                    if code != 0 || self.interactive {
                        println!("[exit status: {}]", code);
                    }
                }
                true
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                eprintln!("crepl: {}", e);
                false
            }
        };
        if self.interrupted.swap(false, Ordering::SeqCst) {
            eprintln!("crepl: interrupted; rolling back the last line");
            self.undo_last_line()?;
            return Ok(());
        }
        if succeeded {
            if let Some(path) = self.cfg.out_file.clone() {
                compile::write_output_file(&path, self.program.compile.total.as_str())?;
            }
        }
        Ok(())
    }

    fn undo_last_line(&mut self) -> Result<bool, ReplError> {
        if !self.program.undo() {
            return Ok(false);
        }
        if self.cfg.track {
            let lines: Vec<String> = self.program.body_lines().map(str::to_string).collect();
            self.vars.replay(lines.iter().map(String::as_str));
        } else {
            self.vars.reset();
        }
        self.refresh_completion_ids();
        self.rebuild()?;
        Ok(true)
    }

    /// Reset the mode flags to their defaults; toggles re-apply their own
    /// flag afterwards.
    fn reset_modes(&mut self) {
        self.cfg.warnings = false;
        self.cfg.track = true;
        self.cfg.parse = true;
        self.cfg.asm_file = None;
        self.cfg.out_file = None;
    }

    /// Reinitialise program state, variable table, histories and argv.
    fn reinit(&mut self) -> Result<(), ReplError> {
        self.program.reset()?;
        self.vars.reset();
        self.cc_argv = opts::build_cc_argv(&self.cfg);
        self.refresh_completion_ids();
        Ok(())
    }

    fn toggle_warnings(&mut self) -> Result<(), ReplError> {
        let on = !self.cfg.warnings;
        self.reset_modes();
        self.cfg.warnings = on;
        self.reinit()
    }

    fn toggle_track(&mut self) -> Result<(), ReplError> {
        let on = !self.cfg.track;
        self.reset_modes();
        self.cfg.track = on;
        self.reinit()
    }

    fn toggle_parse(&mut self) -> Result<(), ReplError> {
        let on = !self.cfg.parse;
        self.reset_modes();
        self.cfg.parse = on;
        self.reinit()
    }

    fn toggle_asm(&mut self, dialect: AsmDialect, arg: &str) -> Result<(), ReplError> {
        // either dialect command switches an active assembly mode off
        if self.cfg.asm_file.is_some() {
            self.reset_modes();
            return self.reinit();
        }
        if arg.is_empty() {
            // the flip is reverted; nothing was reinitialised
            eprintln!("crepl: assembly output needs a file name; mode unchanged");
            return Ok(());
        }
        let file = PathBuf::from(arg);
        self.reset_modes();
        self.cfg.asm_file = Some(file);
        self.cfg.asm_dialect = dialect;
        self.reinit()
    }

    fn toggle_output(&mut self, arg: &str) -> Result<(), ReplError> {
        if self.cfg.out_file.is_some() {
            self.reset_modes();
            return self.reinit();
        }
        if arg.is_empty() {
            eprintln!("crepl: output mirroring needs a file name; mode unchanged");
            return Ok(());
        }
        let file = PathBuf::from(arg);
        self.reset_modes();
        self.cfg.out_file = Some(file);
        self.reinit()
    }

    fn seed_from_file(&mut self, path: &Path) -> Result<(), ReplError> {
        let text = std::fs::read_to_string(path)?;
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            self.program.submit(line)?;
            if self.cfg.track {
                self.vars.find_and_register(line);
            }
        }
        self.refresh_completion_ids();
        self.rebuild()?;
        if self.interactive {
            self.show_listing();
        }
        self.evaluate()
    }

    fn refresh_completion_ids(&mut self) {
        if let Ok(mut ids) = self.completion_ids.lock() {
            ids.clear();
            if self.cfg.parse {
                ids.extend(self.vars.entries().iter().map(|e| e.id.clone()));
            }
        }
    }

    fn show_listing(&self) {
        println!(
            "crepl:\n==========\n{}\n==========",
            self.program.display.total.as_str()
        );
    }

    fn cleanup(&mut self) {
        if let Some(path) = self.cfg.out_file.clone() {
            if let Err(e) = compile::write_output_file(&path, self.program.compile.total.as_str())
            {
                eprintln!("crepl: {}", e);
            }
        }
        let _ = std::fs::remove_file(compile::binary_path());
    }
}

/// Evaluate one expression against a scratch program and exit.
///
/// Persistent session state (history, variable table) is never touched.
pub fn eval_once(expr: &str, cfg: &Config) -> Result<(), ReplError> {
    let mut program = Program::new()?;
    let wrapped = format!("printf(\"result = %lld\\n\", (long long)({}));", expr.trim());
    program.submit(&wrapped)?;
    program.rebuild(None)?;
    let cc_argv = opts::build_cc_argv(cfg);
    let result = if cfg.asm_file.is_some() {
        // assembly mode: write the listing, there is no binary to run
        compile::dump_asm(program.compile.total.as_str(), &cc_argv).map(|()| None)
    } else {
        compile::compile_and_run(program.compile.total.as_str(), &cc_argv).map(Some)
    };
    match result {
        Ok(Some(code)) if code != 0 => {
            println!("[exit status: {}]", code);
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            eprintln!("crepl: {}", e);
            Ok(())
        }
    }
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".crepl_history"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_session() -> Session {
        let mut session = Session::new(Config::default()).expect("session");
        session.program.submit("int x = 5;").expect("submit");
        session.vars.find_and_register("int x = 5;");
        session
    }

    #[test]
    fn every_toggle_clears_program_state_and_history() {
        let toggles: [fn(&mut Session) -> Result<(), ReplError>; 3] = [
            Session::toggle_warnings,
            Session::toggle_track,
            Session::toggle_parse,
        ];
        for toggle in toggles {
            let mut session = seeded_session();
            assert_eq!(session.program.display.history_len(), 1);
            toggle(&mut session).expect("toggle");
            assert_eq!(session.program.display.history_len(), 0);
            assert_eq!(session.program.compile.history_len(), 0);
            assert!(session.vars.is_empty());
            assert!(!session.program.display.body.as_str().contains("int x"));
        }
    }

    #[test]
    fn toggles_reset_the_other_modes_to_defaults() {
        let mut session = seeded_session();
        session.cfg.warnings = true;
        session.toggle_track().expect("toggle");
        assert!(!session.cfg.warnings, "warnings should fall back to default");
        assert!(!session.cfg.track);
        assert!(session.cfg.parse);
    }

    #[test]
    fn warnings_toggle_rebuilds_the_toolchain_argv() {
        let mut session = seeded_session();
        session.toggle_warnings().expect("toggle");
        assert!(session.cfg.warnings);
        assert!(session.cc_argv.contains(&"-Wall".to_string()));
    }

    #[test]
    fn asm_toggle_without_filename_keeps_state() {
        let mut session = seeded_session();
        session.toggle_asm(AsmDialect::Att, "").expect("toggle");
        assert!(session.cfg.asm_file.is_none());
        assert_eq!(session.program.display.history_len(), 1);
        assert!(session.program.display.body.as_str().contains("int x"));
    }

    #[test]
    fn output_toggle_without_filename_keeps_state() {
        let mut session = seeded_session();
        session.toggle_output("").expect("toggle");
        assert!(session.cfg.out_file.is_none());
        assert_eq!(session.program.display.history_len(), 1);
        assert!(!session.vars.is_empty());
    }

    #[test]
    fn asm_toggle_sets_the_mode_and_reinitialises() {
        let mut session = seeded_session();
        session.toggle_asm(AsmDialect::Intel, "/tmp/dump.s").expect("toggle");
        assert_eq!(session.cfg.asm_file, Some(PathBuf::from("/tmp/dump.s")));
        assert_eq!(session.cfg.asm_dialect, AsmDialect::Intel);
        assert_eq!(session.program.display.history_len(), 0);
        assert!(session.cc_argv.contains(&"-S".to_string()));
    }

    #[test]
    fn either_dialect_command_switches_assembly_mode_off() {
        let mut session = seeded_session();
        session.toggle_asm(AsmDialect::Att, "/tmp/att.s").expect("toggle");
        assert!(session.cfg.asm_file.is_some());
        session.toggle_asm(AsmDialect::Intel, "/tmp/intel.s").expect("toggle");
        assert!(session.cfg.asm_file.is_none());
    }

    #[test]
    fn output_toggle_flips_off_when_active() {
        let mut session = seeded_session();
        session.toggle_output("/tmp/out.c").expect("toggle");
        assert!(session.cfg.out_file.is_some());
        session.toggle_output("/tmp/other.c").expect("toggle");
        assert!(session.cfg.out_file.is_none());
    }

    #[test]
    fn eval_once_in_assembly_mode_skips_the_run() {
        // `true` accepts any argv and writes nothing, so a binary never
        // exists; only the assembly branch avoids trying to execute one
        let cfg = Config {
            cc: "true".to_string(),
            asm_file: Some(PathBuf::from("/tmp/eval_dump.s")),
            ..Config::default()
        };
        eval_once("1 + 1", &cfg).expect("assembly eval should not run a binary");
    }
}
