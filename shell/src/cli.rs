//! Process bootstrap: command-line arguments and input source selection.

use crate::error::ShellError;
use crate::io_adapters::{EditorSource, PromptSource, ReaderSource};
use crate::line::LineSource;
use argh::{EarlyExit, FromArgs};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

#[derive(FromArgs, Debug, PartialEq)]
/// Run commands interactively or from a batch file.
pub struct Args {
    #[argh(positional)]
    /// file to read commands from; standard input is used when omitted.
    pub batch_file: Option<PathBuf>,
}

/// What the process should do after looking at its arguments.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Run(Args),
    /// `--help` was requested; print the text and stop.
    Help(String),
}

impl Args {
    /// Parse the arguments that follow the program name. At most one batch
    /// file may be given.
    pub fn parse(command_name: &str, args: &[&str]) -> Result<Invocation, ShellError> {
        match Args::from_args(&[command_name], args) {
            Ok(parsed) => Ok(Invocation::Run(parsed)),
            Err(EarlyExit {
                output,
                status: Ok(()),
            }) => Ok(Invocation::Help(output)),
            Err(EarlyExit { output, .. }) => Err(ShellError::Usage(output.trim().to_owned())),
        }
    }

    pub fn batch_mode(&self) -> bool {
        self.batch_file.is_some()
    }

    /// Pick the line source: the batch file if one was given, else a line
    /// editor on a terminal, else plain standard input with a prompt.
    pub fn open_source(&self) -> Result<Box<dyn LineSource>, ShellError> {
        if let Some(path) = &self.batch_file {
            let file = File::open(path).map_err(|source| ShellError::BatchFile {
                path: path.clone(),
                source,
            })?;
            log::debug!("reading commands from {}", path.display());
            return Ok(Box::new(ReaderSource::new(BufReader::new(file))));
        }

        let stdin = io::stdin();
        if stdin.is_terminal() {
            match EditorSource::new() {
                Ok(editor) => return Ok(Box::new(editor)),
                Err(e) => log::warn!("line editor unavailable, falling back to plain input: {e}"),
            }
        }
        Ok(Box::new(PromptSource::new(stdin.lock())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_arguments_means_interactive() {
        let parsed = Args::parse("myshell", &[]).unwrap();
        assert_eq!(parsed, Invocation::Run(Args { batch_file: None }));
    }

    #[test]
    fn test_single_argument_is_the_batch_file() {
        match Args::parse("myshell", &["commands.txt"]).unwrap() {
            Invocation::Run(args) => {
                assert!(args.batch_mode());
                assert_eq!(args.batch_file, Some(PathBuf::from("commands.txt")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_more_than_one_input_source_is_rejected() {
        assert!(matches!(
            Args::parse("myshell", &["a.txt", "b.txt"]),
            Err(ShellError::Usage(_))
        ));
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(matches!(
            Args::parse("myshell", &["--help"]),
            Ok(Invocation::Help(_))
        ));
    }

    #[test]
    fn test_missing_batch_file_fails_to_open() {
        let args = Args {
            batch_file: Some(PathBuf::from("/nonexistent/myshell/batch.txt")),
        };
        assert!(matches!(
            args.open_source(),
            Err(ShellError::BatchFile { .. })
        ));
    }

    #[test]
    fn test_batch_file_is_read_in_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "pwd\nexit\n").unwrap();

        let args = Args {
            batch_file: Some(file.path().to_path_buf()),
        };
        let mut source = args.open_source().unwrap();
        assert_eq!(source.read_chunk(crate::LINE_LIMIT).unwrap(), Some(b"pwd\n".to_vec()));
        assert_eq!(source.read_chunk(crate::LINE_LIMIT).unwrap(), Some(b"exit\n".to_vec()));
        assert_eq!(source.read_chunk(crate::LINE_LIMIT).unwrap(), None);
    }
}
