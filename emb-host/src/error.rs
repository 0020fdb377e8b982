// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Host exit states and captured non-local exits.

use std::fmt;

use emb_sys::{
    emacs_funcall_exit, emacs_funcall_exit_return, emacs_funcall_exit_signal,
    emacs_funcall_exit_throw, emacs_process_input_quit, emacs_process_input_result,
};

use crate::{Env, Value};

/// How a host call finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncallExit {
    /// Normal return
    Return,
    /// An error was signalled
    Signal,
    /// A `throw` to a catch tag
    Throw,
}

impl FuncallExit {
    /// Decodes the host's exit code.
    ///
    /// Unknown codes are treated as signals so they are never mistaken for a
    /// normal return.
    #[must_use]
    #[allow(non_upper_case_globals)]
    pub const fn from_raw(raw: emacs_funcall_exit) -> Self {
        match raw {
            emacs_funcall_exit_return => Self::Return,
            emacs_funcall_exit_throw => Self::Throw,
            _ => Self::Signal,
        }
    }

    /// The host's exit code
    #[must_use]
    pub const fn to_raw(self) -> emacs_funcall_exit {
        match self {
            Self::Return => emacs_funcall_exit_return,
            Self::Signal => emacs_funcall_exit_signal,
            Self::Throw => emacs_funcall_exit_throw,
        }
    }
}

/// Answer of [`Env::process_input`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessInputResult {
    /// Keep going
    Continue,
    /// The user asked to quit; return to the host promptly
    Quit,
}

impl ProcessInputResult {
    /// Decodes the host's answer
    #[must_use]
    pub const fn from_raw(raw: emacs_process_input_result) -> Self {
        if raw == emacs_process_input_quit { Self::Quit } else { Self::Continue }
    }
}

/// A captured non-local exit.
///
/// Under [`FuncallExit::Signal`] the two values are the error symbol and its
/// data; under [`FuncallExit::Throw`] they are the catch tag and the thrown
/// value. The status is never [`FuncallExit::Return`].
#[derive(Clone, Copy)]
pub struct Error<'e> {
    status: FuncallExit,
    first: Value<'e>,
    second: Value<'e>,
}

impl<'e> Error<'e> {
    /// An error signalled with `symbol` and `data`
    #[must_use]
    pub const fn signal(symbol: Value<'e>, data: Value<'e>) -> Self {
        Self { status: FuncallExit::Signal, first: symbol, second: data }
    }

    /// A throw to `tag` carrying `value`
    #[must_use]
    pub const fn throw(tag: Value<'e>, value: Value<'e>) -> Self {
        Self { status: FuncallExit::Throw, first: tag, second: value }
    }

    /// Rebuilds an error from a host exit code.
    ///
    /// Returns `None` for [`FuncallExit::Return`].
    #[must_use]
    pub fn from_exit(status: FuncallExit, first: Value<'e>, second: Value<'e>) -> Option<Self> {
        match status {
            FuncallExit::Return => None,
            FuncallExit::Signal => Some(Self::signal(first, second)),
            FuncallExit::Throw => Some(Self::throw(first, second)),
        }
    }

    /// Signal or throw
    #[must_use]
    pub const fn status(&self) -> FuncallExit {
        self.status
    }

    /// Whether this is a signal
    #[must_use]
    pub const fn is_signal(&self) -> bool {
        matches!(self.status, FuncallExit::Signal)
    }

    /// Whether this is a throw
    #[must_use]
    pub const fn is_throw(&self) -> bool {
        matches!(self.status, FuncallExit::Throw)
    }

    /// Error symbol of a signal
    #[must_use]
    pub const fn symbol(&self) -> Value<'e> {
        self.first
    }

    /// Data of a signal
    #[must_use]
    pub const fn data(&self) -> Value<'e> {
        self.second
    }

    /// Catch tag of a throw
    #[must_use]
    pub const fn tag(&self) -> Value<'e> {
        self.first
    }

    /// Thrown value
    #[must_use]
    pub const fn value(&self) -> Value<'e> {
        self.second
    }

    /// Asks the host to perform this exit once the current call returns.
    ///
    /// Does nothing if an exit is already pending.
    pub fn report(&self, env: &Env) {
        env.non_local_exit(self);
    }

    /// Renders the error through the host printer, for diagnostics.
    ///
    /// Falls back to the status when printing itself fails.
    pub fn describe(&self) -> String {
        let env = self.first.env();
        env.call("prin1-to-string", (env.list((self.first, self.second)),))
            .and_then(Value::as_string)
            .value_or_else(|_| format!("{:?}", self.status))
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("status", &self.status)
            .field("first", &self.first)
            .field("second", &self.second)
            .finish()
    }
}

impl PartialEq for Error<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.first == other.first && self.second == other.second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_round_trip() {
        for exit in [FuncallExit::Return, FuncallExit::Signal, FuncallExit::Throw] {
            assert_eq!(FuncallExit::from_raw(exit.to_raw()), exit);
        }
        assert_eq!(FuncallExit::from_raw(17), FuncallExit::Signal);
    }

    #[test]
    fn test_process_input() {
        assert_eq!(ProcessInputResult::from_raw(0), ProcessInputResult::Continue);
        assert_eq!(ProcessInputResult::from_raw(1), ProcessInputResult::Quit);
    }
}
