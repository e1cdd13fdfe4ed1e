//! Splitting of command lines into sub-commands and argument vectors.
//!
//! Splitting is deliberately literal: no quoting, no escapes and no
//! collapsing of repeated separators. Lines are handled as raw bytes, so
//! arguments reach programs exactly as they were typed, whatever their
//! encoding.

use std::ffi::{OsStr, OsString};

/// Trim the ASCII whitespace a C `isspace` would strip.
pub fn trim(text: &[u8]) -> &[u8] {
    text.trim_ascii()
}

/// Split a command line on `;` into trimmed, non-empty sub-commands,
/// preserving their left-to-right order.
pub fn split_sub_commands(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|&b| b == b';')
        .map(trim)
        .filter(|part| !part.is_empty())
}

/// Raw bytes as an OS string, without any re-encoding on Unix.
#[cfg(unix)]
pub fn to_os_string(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
pub fn to_os_string(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

/// The program name followed by its arguments, owned by one sub-command
/// execution and released when it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<OsString>,
}

impl ArgumentVector {
    /// First token: the program to run.
    pub fn program(&self) -> &OsStr {
        &self.tokens[0]
    }

    /// Every token after the program name.
    pub fn args(&self) -> &[OsString] {
        &self.tokens[1..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &OsStr> {
        self.tokens.iter().map(OsString::as_os_str)
    }
}

/// Split a command on single ASCII spaces.
///
/// The result always has `spaces + 1` tokens, so consecutive spaces yield
/// empty tokens that are passed on to the program unchanged.
pub fn tokenize(text: &[u8]) -> ArgumentVector {
    ArgumentVector {
        tokens: text.split(|&b| b == b' ').map(to_os_string).collect(),
    }
}
