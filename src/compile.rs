//! Driving the external toolchain
//!
//! The compile-variant total is piped to the compiler over stdin (`-xc -`),
//! the produced binary lands in a per-process temp path, and the binary is
//! run synchronously with inherited stdio so interactive programs work.
//! A rejected translation unit is recoverable; failing to spawn either
//! subprocess is not.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::errors::ReplError;

/// Where the compiled program for this session lives.
pub fn binary_path() -> PathBuf {
    std::env::temp_dir().join(format!("crepl_bin_{}", std::process::id()))
}

/// Pipe `source` to the toolchain and wait for it.
fn translate(source: &str, cc_argv: &[String]) -> Result<ExitStatus, ReplError> {
    let mut child = Command::new(&cc_argv[0])
        .args(&cc_argv[1..])
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| ReplError::SpawnFailed {
            program: cc_argv[0].clone(),
            reason: e.to_string(),
        })?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes())?;
    }
    Ok(child.wait()?)
}

/// Compile the full program text and synchronously run the result.
///
/// Returns the exit code of the compiled program.  A process killed by a
/// signal reports -1; the session layer decides whether that was an
/// interrupt worth rolling back.
pub fn compile_and_run(source: &str, cc_argv: &[String]) -> Result<i32, ReplError> {
    let status = translate(source, cc_argv)?;
    if !status.success() {
        return Err(ReplError::CompileFailed {
            status: status.code().unwrap_or(-1),
        });
    }
    let bin = binary_path();
    let run = Command::new(&bin)
        .status()
        .map_err(|e| ReplError::SpawnFailed {
            program: bin.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(run.code().unwrap_or(-1))
}

/// Emit an assembly listing instead of an executable; nothing is run.
pub fn dump_asm(source: &str, cc_argv: &[String]) -> Result<(), ReplError> {
    let status = translate(source, cc_argv)?;
    if !status.success() {
        return Err(ReplError::CompileFailed {
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Rewrite the session output file with the current program text.
pub fn write_output_file(path: &Path, source: &str) -> Result<(), ReplError> {
    std::fs::write(path, source)?;
    Ok(())
}
