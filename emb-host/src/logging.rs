// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Bridges the module's log buffer to the host.

use emb_error::{Expected, emb_try};

use crate::{Defun, DefunRegistry, Env, LispResult, Value};

/// Drains buffered log lines, rendered as `[level] target: message`.
///
/// Empty when no logger is installed.
#[must_use]
pub fn take_lines() -> Vec<String> {
    emb_logging::installed()
        .map(|logger| logger.drain().iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

fn drain_log<'e>(env: &'e Env, _args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
    let mut lines = Vec::new();
    for line in take_lines() {
        lines.push(emb_try!(env.make_string(&line)));
    }
    env.list(lines)
}

/// Echoes buffered log lines through `message`; returns how many were shown
pub fn flush_to_messages(env: &Env) -> LispResult<'_, usize> {
    let lines = take_lines();
    for line in &lines {
        emb_try!(env.message(format_args!("{line}")));
    }
    Expected::Value(lines.len())
}

/// Logging helpers for [`DefunRegistry`]
pub trait LoggingExt {
    /// Registers `name` as a function of no arguments returning, and
    /// clearing, the buffered log lines as a list of strings
    fn register_log_drain(&mut self, name: &str) -> &mut Self;
}

impl LoggingExt for DefunRegistry {
    fn register_log_drain(&mut self, name: &str) -> &mut Self {
        self.add(Defun::wrapped(
            name,
            "Return the module's buffered log lines, oldest first, and clear them.",
            0,
            Some(0),
            drain_log,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_log_drain() {
        let mut registry = DefunRegistry::new();
        registry.register_log_drain("my-module-log");
        assert!(registry.contains("my-module-log"));
        assert_eq!(registry.len(), 1);
    }
}
