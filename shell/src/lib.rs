//! A small line-oriented command interpreter.
//!
//! Lines are read from a batch file or interactively, split into
//! semicolon-delimited sub-commands and executed one at a time. `cd`, `exit`
//! and `pwd` run in-process; everything else is spawned as an external program
//! whose standard output may be redirected with `>` (create-only) or `>+`
//! (prepend to existing content).
//!
//! The main entry point is [`Interpreter`], which drives a [`LineSource`]
//! and writes to a [`command::Stdout`] console. Every failure is reported to
//! that console as the single line [`ERROR_MESSAGE`].

mod builtin;
pub mod cli;
pub mod command;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod line;
pub mod parser;
mod redirect;
pub mod state;

pub use error::ShellError;
pub use interpreter::Interpreter;
pub use line::LineSource;

/// The one message every failure is reported with.
pub const ERROR_MESSAGE: &str = "An error has occurred\n";

/// Prompt printed before each read in interactive mode.
pub const PROMPT: &str = "myshell> ";

/// Longest chunk a single read may return, terminator included.
pub const LINE_LIMIT: usize = 513;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard, OnceLock};

    /// Serializes tests that change or rely on the process working directory.
    pub fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
