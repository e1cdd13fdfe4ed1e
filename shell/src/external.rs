use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::error::{self, ShellError};
use crate::interpreter::Factory;
use crate::lexer::ArgumentVector;
use crate::parser;
use crate::redirect::OpenedTarget;
use crate::state::InterpreterState;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};

/// Status reported for a program that could not be launched at all.
pub const EXEC_FAILURE: ExitCode = 127;

/// Command that is not a builtin: an external program, possibly with its
/// standard output redirected.
pub struct ExternalCommand {
    command: Vec<u8>,
}

impl ExternalCommand {
    pub fn new(command: impl Into<Vec<u8>>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Claims every sub-command, so it must be the last factory consulted.
impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        _state: &InterpreterState,
        command: &[u8],
    ) -> Option<Box<dyn ExecutableCommand>> {
        Some(Box::new(ExternalCommand::new(command)))
    }
}

impl ExecutableCommand for ExternalCommand {
    /// Parsed, then redirection opened, then spawned and reaped, then the
    /// redirection finished. A failure before the spawn means nothing runs.
    /// Once a `>+` target has been opened, its previous content is restored
    /// on every path, including early returns.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        let (argv, redirection) = parser::parse_command(&self.command)?;

        // Anything the interpreter wrote so far must precede the child's output.
        stdout.flush()?;
        let mut target = redirection.as_ref().map(OpenedTarget::open).transpose()?;
        let child_stdout = match &target {
            Some(target) => target.stdio()?,
            None => stdout.stdio()?,
        };

        let code = match spawn_and_wait(&argv, child_stdout, state) {
            Ok(code) => code,
            Err(e) => {
                // The message goes wherever the program's output would have gone.
                match target.as_mut() {
                    Some(target) => {
                        if let Err(io) = error::report(target.file_mut(), &e) {
                            log::warn!("could not write to redirection target: {io}");
                        }
                    }
                    None => error::report(stdout, &e)?,
                }
                EXEC_FAILURE
            }
        };

        if let Some(target) = target {
            target.finish()?;
        }
        Ok(code)
    }
}

/// Launch `argv` and block until that child has terminated.
fn spawn_and_wait(
    argv: &ArgumentVector,
    stdout: Stdio,
    state: &InterpreterState,
) -> Result<ExitCode, ShellError> {
    let program = argv.program();
    let exec_err = |source: io::Error| ShellError::Exec {
        program: program.to_string_lossy().into_owned(),
        source,
    };

    let search_paths = state.get_var("PATH").unwrap_or_default();
    let executable = find_command_path(OsStr::new(&search_paths), Path::new(program))
        .ok_or_else(|| exec_err(io::ErrorKind::NotFound.into()))?;

    let mut command = StdCommand::new(&*executable);
    command.args(argv.args()).stdout(stdout);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(program);
    }

    let mut child = command.spawn().map_err(exec_err)?;
    log::debug!("spawned '{}' as pid {}", executable.display(), child.id());
    let exit_status = child.wait().map_err(exec_err)?;
    log::debug!("pid {} exited with {exit_status}", child.id());

    Ok(match exit_status.code() {
        Some(code) => code,
        None => terminated_by_signal(exit_status),
    })
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a program path the way `execvp` would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh` or `./foo`): returns it
///   if it exists relative to the current directory.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(single), None) if !path.as_os_str().to_string_lossy().contains('/') => {
            find_in_path(search_paths, single.as_os_str()).map(Cow::Owned)
        }
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

/// Candidates that are not executable are skipped, as `execvp` does.
fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
