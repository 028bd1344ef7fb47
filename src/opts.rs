//! Command-line options and toolchain argv derivation

use std::path::PathBuf;

pub const VERSION: &str = concat!("crepl v", env!("CARGO_PKG_VERSION"));

pub const USAGE: &str = "usage: crepl [-hptvw] [-c compiler] [-e expr] [-f file] [-a file] [-o file] [-l lib] [-I dir]

	-a <file>	write AT&T-dialect assembly to <file> instead of running
	-c <compiler>	use <compiler> instead of gcc
	-e <expr>	evaluate <expr> once and exit
	-f <file>	feed each line of <file> through the session at startup
	-h		show this help and exit
	-I <dir>	add <dir> to the include search path (repeatable)
	-l <lib>	link against <lib> (repeatable)
	-o <file>	mirror the full program text to <file> after each run
	-p		do not offer tracked identifiers as completions
	-t		disable variable tracking
	-v		show the version and exit
	-w		enable compiler warnings (-pedantic-errors -Wall -Wextra)
";

/// Assembly dialect for the `;a` / `;i` modes and the `-a` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmDialect {
    Att,
    Intel,
}

/// Session configuration, from the command line and the `;` toggles.
#[derive(Debug, Clone)]
pub struct Config {
    pub cc: String,
    pub warnings: bool,
    pub track: bool,
    pub parse: bool,
    pub out_file: Option<PathBuf>,
    pub asm_file: Option<PathBuf>,
    pub asm_dialect: AsmDialect,
    pub eval_expr: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub libs: Vec<String>,
    pub include_dirs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cc: "gcc".to_string(),
            warnings: false,
            track: true,
            parse: true,
            out_file: None,
            asm_file: None,
            asm_dialect: AsmDialect::Att,
            eval_expr: None,
            seed_file: None,
            libs: Vec::new(),
            include_dirs: Vec::new(),
        }
    }
}

/// Outcome of argument parsing.
#[derive(Debug)]
pub enum Parsed {
    Run(Config),
    Help,
    Version,
}

/// Parse the arguments after the program name.
///
/// Option values may be attached (`-lssl`) or detached (`-l ssl`).
pub fn parse_args<I>(mut args: I) -> Result<Parsed, String>
where
    I: Iterator<Item = String>,
{
    let mut cfg = Config::default();
    while let Some(arg) = args.next() {
        let mut chars = arg.chars();
        if chars.next() != Some('-') {
            return Err(format!("unexpected argument '{}'", arg));
        }
        let flag = match chars.next() {
            Some(flag) => flag,
            None => return Err("unexpected argument '-'".to_string()),
        };
        let attached: String = chars.collect();
        match flag {
            'h' => return Ok(Parsed::Help),
            'v' => return Ok(Parsed::Version),
            'w' => cfg.warnings = true,
            'p' => cfg.parse = false,
            't' => cfg.track = false,
            'c' => cfg.cc = take_value(flag, attached, &mut args)?,
            'e' => cfg.eval_expr = Some(take_value(flag, attached, &mut args)?),
            'f' => cfg.seed_file = Some(PathBuf::from(take_value(flag, attached, &mut args)?)),
            'a' => cfg.asm_file = Some(PathBuf::from(take_value(flag, attached, &mut args)?)),
            'o' => cfg.out_file = Some(PathBuf::from(take_value(flag, attached, &mut args)?)),
            'l' => cfg.libs.push(take_value(flag, attached, &mut args)?),
            'I' => cfg.include_dirs.push(take_value(flag, attached, &mut args)?),
            _ => return Err(format!("unknown option -{}", flag)),
        }
    }
    if cfg.asm_file.is_some() && cfg.out_file.is_some() {
        return Err("-a and -o are mutually exclusive".to_string());
    }
    Ok(Parsed::Run(cfg))
}

fn take_value<I>(flag: char, attached: String, args: &mut I) -> Result<String, String>
where
    I: Iterator<Item = String>,
{
    if !attached.is_empty() {
        return Ok(attached);
    }
    match args.next() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("option -{} requires an argument", flag)),
    }
}

/// Derive the toolchain argv for the current configuration.
///
/// Source arrives on stdin (`-xc -`).  In assembly mode the compiler stops
/// at `-S` and the listing replaces the binary as the output; libraries are
/// only linked when a binary is actually produced.
pub fn build_cc_argv(cfg: &Config) -> Vec<String> {
    let mut argv: Vec<String> = vec![
        cfg.cc.clone(),
        "-O0".to_string(),
        "-pipe".to_string(),
        "-std=c11".to_string(),
    ];
    for dir in &cfg.include_dirs {
        argv.push(format!("-I{}", dir));
    }
    if cfg.warnings {
        argv.extend(
            ["-pedantic-errors", "-Wall", "-Wextra"]
                .iter()
                .map(|s| s.to_string()),
        );
    }
    if let Some(asm_file) = &cfg.asm_file {
        argv.push("-S".to_string());
        argv.push(
            match cfg.asm_dialect {
                AsmDialect::Att => "-masm=att",
                AsmDialect::Intel => "-masm=intel",
            }
            .to_string(),
        );
        argv.push("-xc".to_string());
        argv.push("-".to_string());
        argv.push("-o".to_string());
        argv.push(asm_file.display().to_string());
    } else {
        argv.push("-xc".to_string());
        argv.push("-".to_string());
        argv.push("-o".to_string());
        argv.push(crate::compile::binary_path().display().to_string());
        for lib in &cfg.libs {
            argv.push(format!("-l{}", lib));
        }
    }
    argv
}
