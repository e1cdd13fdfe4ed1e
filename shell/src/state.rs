use std::collections::HashMap;
use std::env as stdenv;

/// Per-interpreter state threaded through every sub-command.
///
/// The state contains:
/// - `vars`: a snapshot of the environment used for `HOME` and `PATH` lookups.
///   Spawned programs still inherit the real process environment.
/// - `batch_mode`: whether lines come from a batch file and must be echoed.
/// - `should_exit`: set by `exit`; the read-execute loop stops once it is true.
#[derive(Debug, Clone)]
pub struct InterpreterState {
    pub vars: HashMap<String, String>,
    pub batch_mode: bool,
    pub should_exit: bool,
}

impl InterpreterState {
    /// Capture the current process environment into a new state.
    pub fn new(batch_mode: bool) -> Self {
        Self {
            // Variables that are not valid Unicode are skipped.
            vars: stdenv::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
            batch_mode,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a variable in the snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self::new(false)
    }
}
