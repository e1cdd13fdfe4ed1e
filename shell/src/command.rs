use crate::error::ShellError;
use crate::state::InterpreterState;
use std::fs::File;
use std::io::{self, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// The interpreter's console: where echoes, builtin output and error
/// messages are written, and what spawned programs inherit as standard
/// output when no redirection is active.
///
/// Implementations exist for the real standard output, for files (so tests
/// can observe interpreter and child output interleaved in order) and for
/// in-memory buffers (children get a null output).
pub trait Stdout: Write {
    /// Produce a [`Stdio`] handle that lets a child share this console.
    fn stdio(&self) -> io::Result<Stdio>;
}

impl Stdout for io::Stdout {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::inherit())
    }
}

impl Stdout for File {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(self.try_clone()?.into())
    }
}

impl Stdout for Vec<u8> {
    fn stdio(&self) -> io::Result<Stdio> {
        Ok(Stdio::null())
    }
}

/// Object-safe trait for any sub-command the interpreter can run.
///
/// Implemented by builtins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError>;
}

/// Factory that tries to create a command from the trimmed sub-command bytes.
///
/// Returns `None` when the factory doesn't recognize the text.
pub trait CommandFactory {
    fn try_create(
        &self,
        state: &InterpreterState,
        command: &[u8],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
