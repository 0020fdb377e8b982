// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Registry of functions to bind at module init.
//!
//! The module's register function fills a [`DefunRegistry`] in order; module
//! init then drains it once against the live environment. Each init builds
//! its own registry.

use emb_error::Expected;

use crate::{Defun, Env, LispResult};

/// Ordered list of functions waiting to be bound
#[derive(Debug, Default)]
pub struct DefunRegistry {
    defuns: Vec<Defun>,
}

impl DefunRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self { defuns: Vec::new() }
    }

    /// Appends a function; returns the registry for chaining
    pub fn add(&mut self, defun: Defun) -> &mut Self {
        log::trace!("registered {}", defun.name());
        self.defuns.push(defun);
        self
    }

    /// Number of functions waiting to be bound
    #[must_use]
    pub fn len(&self) -> usize {
        self.defuns.len()
    }

    /// Whether nothing is waiting to be bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defuns.is_empty()
    }

    /// Whether a function is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.defuns.iter().any(|defun| defun.name() == name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defuns.iter().map(Defun::name)
    }

    /// Drops every registered function without binding it
    pub fn clear(&mut self) {
        self.defuns.clear();
    }

    /// Binds every registered function, in order.
    ///
    /// The registry is empty afterwards. Binding stops at the first failure;
    /// functions after it are dropped unbound. Returns the number bound.
    pub fn def<'e>(&mut self, env: &'e Env) -> LispResult<'e, usize> {
        let mut bound = 0;
        for defun in self.defuns.drain(..) {
            let name = defun.name().to_owned();
            if let Expected::Unexpected(error) = defun.def(env) {
                log::error!("failed to bind {name}: {}", error.describe());
                return Expected::Unexpected(error);
            }
            bound += 1;
        }
        log::info!("bound {bound} module function(s)");
        Expected::Value(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop(_env: &Env) {}

    #[test]
    fn test_registry_order_and_clear() {
        let mut registry = DefunRegistry::new();
        assert!(registry.is_empty());

        registry
            .add(Defun::universal("first", "", nop))
            .add(Defun::universal("second", "", |_: &Env, n: i64| n + 1));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("second"));
        assert!(!registry.contains("third"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["first", "second"]);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.names().count(), 0);
    }
}
