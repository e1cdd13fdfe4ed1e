use crate::command::{CommandFactory, ExitCode, Stdout};
use crate::error::{self, ShellError};
use crate::lexer;
use crate::line::{Line, LineSource, LineValidator};
use crate::state::InterpreterState;
use crate::LINE_LIMIT;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and ExternalCommand.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A line-oriented interpreter that runs builtins in-process and spawns
/// everything else.
///
/// The interpreter owns an [`InterpreterState`] and a list of
/// [`CommandFactory`] objects queried in order for each sub-command. The
/// first factory that claims a sub-command runs it.
///
/// Example
/// ```
/// use myshell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// sh.execute_line("exit now; exit; pwd", &mut out).unwrap();
/// assert_eq!(out, myshell::ERROR_MESSAGE.as_bytes());
/// assert!(sh.should_exit());
/// ```
pub struct Interpreter {
    state: InterpreterState,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(state: InterpreterState, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { state, commands }
    }

    /// An interpreter with the default commands, echoing lines in batch mode.
    pub fn with_batch_mode(batch_mode: bool) -> Self {
        let mut sh = Self::default();
        sh.state.batch_mode = batch_mode;
        sh
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.state.should_exit
    }

    /// Read and execute lines from `source` until the input ends or `exit`
    /// runs. Only failures of the console or the input itself are returned;
    /// everything else is reported on `out` and the loop carries on.
    pub fn run<S, O>(&mut self, source: S, out: &mut O) -> anyhow::Result<()>
    where
        S: LineSource,
        O: Stdout,
    {
        let mut lines = LineValidator::new(source, self.state.batch_mode);
        while !self.state.should_exit {
            lines.prompt(out)?;
            match lines.read(out)? {
                None => {
                    log::debug!("end of input");
                    break;
                }
                Some(Line::Blank) => {}
                Some(Line::Malformed) => {
                    error::report(out, &ShellError::LineTooLong { limit: LINE_LIMIT })?
                }
                Some(Line::Valid(line)) => self.execute_line(&line, out)?,
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Execute every sub-command of one line in order, each one finished
    /// before the next starts. An `exit` skips the rest of the line.
    pub fn execute_line<L, O>(&mut self, line: L, out: &mut O) -> anyhow::Result<()>
    where
        L: AsRef<[u8]>,
        O: Stdout,
    {
        for sub_command in lexer::split_sub_commands(line.as_ref()) {
            match self.execute_sub_command(sub_command, out) {
                Ok(code) => log::debug!(
                    "'{}' finished with status {code}",
                    String::from_utf8_lossy(sub_command)
                ),
                Err(ShellError::Console(e)) => return Err(e.into()),
                Err(e) => error::report(out, &e)?,
            }
            if self.state.should_exit {
                break;
            }
        }
        Ok(())
    }

    fn execute_sub_command(
        &mut self,
        command: &[u8],
        out: &mut dyn Stdout,
    ) -> Result<ExitCode, ShellError> {
        let cmd = self
            .commands
            .iter()
            .find_map(|factory| factory.try_create(&self.state, command))
            .ok_or_else(|| ShellError::Exec {
                program: String::from_utf8_lossy(command).into_owned(),
                source: std::io::ErrorKind::NotFound.into(),
            })?;
        cmd.execute(out, &mut self.state)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `cd`, `exit`, `pwd`, matched by prefix in that order
    /// - external command launcher for everything else
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(
            InterpreterState::default(),
            vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ERROR_MESSAGE;
    use crate::io_adapters::{PromptSource, ReaderSource};
    use crate::test_support::lock_current_dir;
    use std::fs::{self, File};
    use std::io::{Cursor, Read, Seek};

    fn batch(input: &str) -> ReaderSource<Cursor<Vec<u8>>> {
        ReaderSource::new(Cursor::new(input.as_bytes().to_vec()))
    }

    fn console_text(mut console: File) -> String {
        let mut text = String::new();
        console.rewind().unwrap();
        console.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_whitespace_only_input_does_nothing() {
        let mut sh = Interpreter::with_batch_mode(true);
        let mut out = Vec::new();
        sh.run(batch("   \n\t\n \t \n"), &mut out).unwrap();
        assert!(out.is_empty());
        assert!(!sh.should_exit());
    }

    #[test]
    fn test_batch_mode_echoes_each_line_before_running_it() {
        let mut sh = Interpreter::with_batch_mode(true);
        let mut out = Vec::new();
        sh.run(batch("exit now\n\nexit\npwd\n"), &mut out).unwrap();

        let expected = format!("exit now\n{ERROR_MESSAGE}exit\n");
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert!(sh.should_exit());
    }

    #[test]
    fn test_interactive_mode_prompts_without_echo() {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let source = PromptSource::new(Cursor::new(b"pwdx\n".to_vec()));
        sh.run(source, &mut out).unwrap();

        let expected = format!("{p}{ERROR_MESSAGE}{p}", p = crate::PROMPT);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_overlong_line_is_echoed_reported_and_skipped() {
        let long = "e".repeat(LINE_LIMIT + 20);
        let input = format!("{long}\nexit\n");

        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        sh.run(batch(&input), &mut out).unwrap();

        let expected = format!("{long}\n{ERROR_MESSAGE}");
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert!(sh.should_exit());
    }

    #[test]
    fn test_exit_stops_the_rest_of_the_line() {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        sh.execute_line("exit; pwd; exit now", &mut out).unwrap();
        assert!(out.is_empty());
        assert!(sh.should_exit());
    }

    #[test]
    #[cfg(unix)]
    fn test_sub_commands_run_in_order_and_each_completes() {
        let _lock = lock_current_dir();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("order.txt");
        let t = target.display();

        let mut sh = Interpreter::default();
        let mut console = tempfile::tempfile().unwrap();
        sh.execute_line(
            format!("echo one > {t}; echo two >+ {t}; echo three >+ {t}"),
            &mut console,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "three\ntwo\none\n");
        assert_eq!(console_text(console), "");
    }

    #[test]
    #[cfg(unix)]
    fn test_interpreter_and_child_output_interleave_in_order() {
        let _lock = lock_current_dir();
        let mut sh = Interpreter::with_batch_mode(true);
        let mut console = tempfile::tempfile().unwrap();
        sh.run(batch("echo first ; pwdx\necho second\n"), &mut console)
            .unwrap();

        let expected = format!("echo first ; pwdx\nfirst\n{ERROR_MESSAGE}echo second\nsecond\n");
        assert_eq!(console_text(console), expected);
    }

    #[test]
    #[cfg(unix)]
    fn test_invalid_redirection_is_reported_and_line_continues() {
        let _lock = lock_current_dir();
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("existing.txt");
        fs::write(&existing, "prior").unwrap();

        let mut sh = Interpreter::default();
        let mut console = tempfile::tempfile().unwrap();
        sh.execute_line(
            format!("echo lost > {}; echo kept", existing.display()),
            &mut console,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(&existing).unwrap(), "prior");
        assert_eq!(console_text(console), format!("{ERROR_MESSAGE}kept\n"));
    }

    #[test]
    #[cfg(unix)]
    fn test_cd_then_relative_redirection_lands_in_new_directory() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut sh = Interpreter::default();
        let mut console = tempfile::tempfile().unwrap();
        let line = format!(
            "cd {}; echo here > rel.txt; cd /nonexistent/myshell/dir",
            dir.path().display()
        );
        let res = sh.execute_line(&line, &mut console);
        std::env::set_current_dir(&orig).unwrap();

        res.unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("rel.txt")).unwrap(), "here\n");
        assert_eq!(console_text(console), ERROR_MESSAGE);
    }

    #[test]
    fn test_no_factory_claiming_a_command_is_reported() {
        let mut sh = Interpreter::new(InterpreterState::default(), Vec::new());
        let mut out = Vec::new();
        sh.execute_line("anything", &mut out).unwrap();
        assert_eq!(out, ERROR_MESSAGE.as_bytes());
    }
}
