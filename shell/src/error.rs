use crate::ERROR_MESSAGE;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while reading or running a command line.
///
/// The variants carry enough detail for the debug log. Users never see it:
/// [`report`] collapses every kind into [`ERROR_MESSAGE`].
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("line is longer than {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("invalid redirection: {0}")]
    RedirectionInvalid(String),
    #[error("redirection target '{}' could not be prepared", path.display())]
    RedirectionIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{command}: {reason}")]
    BuiltinArgument {
        command: &'static str,
        reason: String,
    },
    #[error("'{program}' could not be executed")]
    Exec {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("console is not writable")]
    Console(#[from] io::Error),
    #[error("usage: {0}")]
    Usage(String),
    #[error("batch file '{}' could not be opened", path.display())]
    BatchFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    pub(crate) fn redirection_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ShellError::RedirectionIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn builtin(command: &'static str, reason: impl Into<String>) -> Self {
        ShellError::BuiltinArgument {
            command,
            reason: reason.into(),
        }
    }
}

/// Report an error through the uniform error channel.
pub fn report<W: Write + ?Sized>(out: &mut W, err: &ShellError) -> io::Result<()> {
    log::debug!("{err}");
    out.write_all(ERROR_MESSAGE.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_writes_only_the_generic_message() {
        let mut out = Vec::new();
        let err = ShellError::builtin("cd", "no such directory: /nowhere");
        report(&mut out, &err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "An error has occurred\n");
    }

    #[test]
    fn test_display_keeps_detail_for_logs() {
        let err = ShellError::RedirectionInvalid("target 'a b' contains whitespace".into());
        assert_eq!(
            err.to_string(),
            "invalid redirection: target 'a b' contains whitespace"
        );
    }
}
