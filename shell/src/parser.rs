use crate::error::ShellError;
use crate::lexer::{self, ArgumentVector};
use std::path::PathBuf;

/// How standard output is sent to the redirection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionMode {
    /// `>`: the target is created and must not exist beforehand.
    OverwriteCreate,
    /// `>+`: new output goes first, any previous content is kept after it.
    PreservePrepend,
}

impl RedirectionMode {
    /// Detection order. `>+` comes first so it is never taken for `>`.
    const DETECTION_ORDER: [RedirectionMode; 2] = [
        RedirectionMode::PreservePrepend,
        RedirectionMode::OverwriteCreate,
    ];

    pub fn operator(self) -> &'static str {
        match self {
            RedirectionMode::OverwriteCreate => ">",
            RedirectionMode::PreservePrepend => ">+",
        }
    }
}

/// A validated output redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub mode: RedirectionMode,
    pub target: PathBuf,
}

/// Separate a redirection operator and its target from a sub-command.
///
/// The operator is detected with `>+` taking precedence, and the target is
/// whatever follows that operator. The command itself ends at the first `>`
/// of any kind, so in `echo a > b >+ c` the program sees only `echo a`. The
/// target is validated here, including the create-only rule of `>`; for `>+`
/// existence is irrelevant.
pub fn resolve_redirection(
    command: &[u8],
) -> Result<(&[u8], Option<RedirectionSpec>), ShellError> {
    let Some((mode, at)) = RedirectionMode::DETECTION_ORDER
        .iter()
        .find_map(|&mode| find(command, mode.operator().as_bytes()).map(|at| (mode, at)))
    else {
        return Ok((command, None));
    };

    let target = lexer::trim(&command[at + mode.operator().len()..]);
    let shown = String::from_utf8_lossy(target);
    if target.is_empty() {
        return Err(ShellError::RedirectionInvalid(format!(
            "missing target after '{}'",
            mode.operator()
        )));
    }
    if target.contains(&b'>') || target.iter().any(u8::is_ascii_whitespace) {
        return Err(ShellError::RedirectionInvalid(format!(
            "target '{shown}' contains '>' or whitespace"
        )));
    }
    let target = PathBuf::from(lexer::to_os_string(target));
    if mode == RedirectionMode::OverwriteCreate && target.exists() {
        return Err(ShellError::RedirectionInvalid(format!(
            "target '{shown}' already exists"
        )));
    }

    let cut = command.iter().position(|&b| b == b'>').unwrap_or(at);
    Ok((lexer::trim(&command[..cut]), Some(RedirectionSpec { mode, target })))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Resolve the redirection of an external sub-command and tokenize the rest.
pub fn parse_command(
    command: &[u8],
) -> Result<(ArgumentVector, Option<RedirectionSpec>), ShellError> {
    let (invocation, redirection) = resolve_redirection(command)?;
    Ok((lexer::tokenize(invocation), redirection))
}
