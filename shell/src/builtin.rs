use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::error::ShellError;
use crate::interpreter::Factory;
use crate::lexer;
use crate::state::InterpreterState;
use std::env;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins run synchronously inside the interpreter's own process. They are
/// selected by prefix: any sub-command whose text starts with [`name`] goes
/// to the builtin, which then decides from the whole text whether the
/// invocation is acceptable.
///
/// [`name`]: BuiltinCommand::name
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Build the command from the full trimmed sub-command.
    fn parse(command: &[u8]) -> Result<Self, ShellError>;

    fn execute(
        self,
        stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        <T as BuiltinCommand>::execute(*self, stdout, state)
    }
}

/// A builtin invocation whose arguments were rejected; running it reports
/// the error and does nothing else.
struct InvalidArgs(ShellError);

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdout: &mut dyn Stdout,
        _state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        Err(self.0)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _state: &InterpreterState,
        command: &[u8],
    ) -> Option<Box<dyn ExecutableCommand>> {
        // Prefix match: "cdfoo" is routed to cd, which then rejects it.
        if !command.starts_with(T::name().as_bytes()) {
            return None;
        }
        Some(match T::parse(command) {
            Ok(cmd) => Box::new(cmd),
            Err(e) => Box::new(InvalidArgs(e)),
        })
    }
}

fn unexpected(name: &'static str, command: &[u8]) -> ShellError {
    ShellError::builtin(
        name,
        format!("unexpected input '{}'", String::from_utf8_lossy(command)),
    )
}

/// Print the current working directory to standard output.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn parse(command: &[u8]) -> Result<Self, ShellError> {
        if command == Self::name().as_bytes() {
            Ok(Pwd)
        } else {
            Err(unexpected("pwd", command))
        }
    }

    fn execute(
        self,
        stdout: &mut dyn Stdout,
        _state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        match env::current_dir() {
            Ok(cwd) => writeln!(stdout, "{}", cwd.display())?,
            // Nothing is printed and nothing is reported.
            Err(e) => log::warn!("pwd: working directory unavailable: {e}"),
        }
        Ok(0)
    }
}

/// Change the current working directory.
/// If no target is provided, changes to the directory named by `HOME`.
pub struct Cd {
    pub target: Option<PathBuf>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    /// Everything after the first space, trimmed, is the target. A bare `cd`
    /// has no target; any other text without a space is rejected.
    fn parse(command: &[u8]) -> Result<Self, ShellError> {
        if command == Self::name().as_bytes() {
            return Ok(Cd { target: None });
        }
        match command.iter().position(|&b| b == b' ') {
            Some(space) => {
                let rest = lexer::trim(&command[space + 1..]);
                Ok(Cd {
                    target: Some(PathBuf::from(lexer::to_os_string(rest))),
                })
            }
            None => Err(unexpected("cd", command)),
        }
    }

    fn execute(
        self,
        _stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        let target = match self.target {
            Some(target) => {
                if !target.exists() {
                    return Err(ShellError::builtin(
                        "cd",
                        format!("no such path: {}", target.display()),
                    ));
                }
                target
            }
            None => match state.get_var("HOME") {
                Some(home) => PathBuf::from(home),
                None => {
                    log::warn!("cd: HOME is not set");
                    return Ok(1);
                }
            },
        };
        Ok(change_dir(&target))
    }
}

/// `chdir` failures past the existence check are silent, as for `HOME`.
fn change_dir(target: &Path) -> ExitCode {
    match env::set_current_dir(target) {
        Ok(()) => {
            log::debug!("cd: now in {}", target.display());
            0
        }
        Err(e) => {
            log::warn!("cd: can't chdir to {}: {e}", target.display());
            1
        }
    }
}

/// Exit the interpreter with success status. Accepts no arguments.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn parse(command: &[u8]) -> Result<Self, ShellError> {
        if command == Self::name().as_bytes() {
            Ok(Exit)
        } else {
            Err(unexpected("exit", command))
        }
    }

    fn execute(
        self,
        _stdout: &mut dyn Stdout,
        state: &mut InterpreterState,
    ) -> Result<ExitCode, ShellError> {
        state.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_current_dir;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::fs;

    fn empty_state() -> InterpreterState {
        InterpreterState {
            vars: HashMap::new(),
            batch_mode: false,
            should_exit: false,
        }
    }

    /// Run `command` through the builtin factories the way the interpreter does.
    fn dispatch(
        command: &str,
        state: &mut InterpreterState,
    ) -> Option<Result<ExitCode, ShellError>> {
        let factories: Vec<Box<dyn CommandFactory>> = vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Pwd>::default()),
        ];
        let cmd = factories
            .iter()
            .find_map(|factory| factory.try_create(state, command.as_bytes()))?;
        Some(cmd.execute(&mut Vec::new(), state))
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();

        let mut out = Vec::new();
        let res = Pwd.execute(&mut out, &mut empty_state());

        assert_eq!(res.unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", cur.display()));
    }

    #[test]
    fn test_pwd_with_arguments_is_rejected() {
        assert!(Pwd::parse(b"pwd").is_ok());
        assert!(Pwd::parse(b"pwd -L").is_err());
        assert!(Pwd::parse(b"pwdx").is_err());
    }

    #[test]
    fn test_exit_requires_exact_text() {
        let mut state = empty_state();
        assert!(matches!(
            dispatch("exit now", &mut state),
            Some(Err(ShellError::BuiltinArgument { command: "exit", .. }))
        ));
        assert!(!state.should_exit);

        assert!(matches!(dispatch("exit", &mut state), Some(Ok(0))));
        assert!(state.should_exit);
    }

    #[test]
    fn test_non_builtins_are_not_claimed() {
        let mut state = empty_state();
        assert!(dispatch("ls -l", &mut state).is_none());
        assert!(dispatch("echo cd", &mut state).is_none());
    }

    #[test]
    fn test_prefix_match_routes_cdfoo_to_cd() {
        let mut state = empty_state();
        assert!(matches!(
            dispatch("cdfoo", &mut state),
            Some(Err(ShellError::BuiltinArgument { command: "cd", .. }))
        ));
        assert!(matches!(
            dispatch("pwdx", &mut state),
            Some(Err(ShellError::BuiltinArgument { command: "pwd", .. }))
        ));
    }

    #[test]
    fn test_cd_parse_takes_text_after_first_space() {
        assert_eq!(Cd::parse(b"cd").unwrap().target, None);
        assert_eq!(
            Cd::parse(b"cd   some dir ").unwrap().target,
            Some(PathBuf::from("some dir"))
        );
        // The prefix quirk: the name part is never checked past "cd".
        assert_eq!(Cd::parse(b"cdx /tmp").unwrap().target, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_cd_to_absolute_path() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let res = dispatch(&format!("cd {}", canonical_temp.display()), &mut empty_state());
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(matches!(res, Some(Ok(0))));
        assert_eq!(new_cwd, canonical_temp);
    }

    #[test]
    fn test_cd_to_home_when_none() {
        let _lock = lock_current_dir();
        let temp = tempfile::tempdir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(temp.path()).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let mut state = empty_state();
        state.set_var("HOME", canonical_temp.to_string_lossy().to_string());

        let res = dispatch("cd", &mut state);
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        stdenv::set_current_dir(&orig).expect("failed to restore cwd");

        assert!(matches!(res, Some(Ok(0))));
        assert_eq!(new_cwd, canonical_temp);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let res = dispatch("cd /nonexistent/path/for/myshell/tests", &mut empty_state());

        assert!(matches!(
            res,
            Some(Err(ShellError::BuiltinArgument { command: "cd", .. }))
        ));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }
}
