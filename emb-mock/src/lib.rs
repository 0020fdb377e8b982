// EMB - emb-mock
// Module: Fake host
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! An in-process fake of the Emacs side of the dynamic module ABI.
//!
//! [`MockHost`] owns an `emacs_runtime` and an `emacs_env` whose entries run
//! against a small Lisp heap: symbols, fixnums, floats, strings, conses,
//! vectors, user pointers and module functions, plus the builtins a module
//! usually reaches for (`list`, `eval`, `defalias`, `provide`, `message`,
//! `format`, ...). Non-local exits follow host rules: a pending exit makes
//! every later entry a no-op until it is cleared.
//!
//! Tables can be cut down to an older host's size with
//! [`MockHost::with_version`] to exercise version gating.
//!
//! ```no_run
//! use emb_mock::MockHost;
//!
//! let host = MockHost::new();
//! let env = host.env();
//! assert!(!env.is_null());
//! ```

#![warn(missing_docs)]

mod builtins;
mod heap;
mod host;
mod table;

use std::fmt;

use emb_sys::{HostVersion, RUNTIME_SIZE, emacs_env, emacs_runtime, ptrdiff_t};

use crate::{heap::Object, host::Host};

unsafe extern "C" fn get_environment(runtime: *mut emacs_runtime) -> *mut emacs_env {
    // SAFETY: runtimes built by `MockHost` point their private members at
    // the environment table.
    unsafe { (*runtime).private_members.cast() }
}

/// A fake host with one environment
pub struct MockHost {
    host: Box<Host>,
    env: *mut emacs_env,
    runtime: *mut emacs_runtime,
}

impl MockHost {
    /// A host with the newest supported table
    #[must_use]
    pub fn new() -> Self {
        Self::with_version(HostVersion::Emacs28)
    }

    /// A host whose environment table stops at `version`
    #[must_use]
    pub fn with_version(version: HostVersion) -> Self {
        Self::with_env_size(version.env_size() as isize)
    }

    /// A host reporting an arbitrary environment size.
    ///
    /// Sizes below the Emacs 25 table are accepted so that init failures can
    /// be tested; the table itself is always complete.
    #[must_use]
    pub fn with_env_size(size: isize) -> Self {
        let host = Box::new(Host::new());
        let host_ptr = std::ptr::from_ref::<Host>(&*host).cast_mut();
        let env = Box::into_raw(Box::new(table::env_table(size as ptrdiff_t, host_ptr)));
        host.env.set(env);
        let runtime = Box::into_raw(Box::new(emacs_runtime {
            size: RUNTIME_SIZE as ptrdiff_t,
            private_members: env.cast(),
            get_environment,
        }));
        Self { host, env, runtime }
    }

    /// Overrides the size the runtime table reports
    #[must_use]
    pub fn with_runtime_size(self, size: isize) -> Self {
        // SAFETY: the runtime table is owned by `self`.
        unsafe { (*self.runtime).size = size as ptrdiff_t };
        self
    }

    /// The runtime table to pass to `emacs_module_init`
    #[must_use]
    pub fn runtime(&self) -> *mut emacs_runtime {
        self.runtime
    }

    /// The environment table, valid while `self` lives
    #[must_use]
    pub fn env(&self) -> *mut emacs_env {
        self.env
    }

    /// Lines shown with `message`, oldest first
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.host.messages.borrow().clone()
    }

    /// Features announced with `provide`, in order
    #[must_use]
    pub fn features(&self) -> Vec<String> {
        let heap = self.host.heap.borrow();
        heap.features.iter().filter_map(|&id| heap.symbol_name(id).map(str::to_owned)).collect()
    }

    /// Whether `name` has a function definition
    #[must_use]
    pub fn is_fbound(&self, name: &str) -> bool {
        let mut heap = self.host.heap.borrow_mut();
        let symbol = heap.intern(name);
        heap.symbol(symbol).is_some_and(|symbol| symbol.function.is_some())
    }

    /// Printed value of the variable `name`, if bound
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<String> {
        let mut heap = self.host.heap.borrow_mut();
        let symbol = heap.intern(name);
        let value = heap.symbol(symbol)?.value?;
        let mut out = String::new();
        builtins::prin1(&heap, value, &mut out);
        Some(out)
    }

    /// Module function reached from the symbol `name`
    fn module_function<T>(&self, name: &str, f: impl FnOnce(&heap::Heap, &heap::ModuleFunction) -> T) -> Option<T> {
        let mut heap = self.host.heap.borrow_mut();
        let mut current = heap.intern(name);
        for _ in 0..16 {
            match heap.get(current)? {
                Object::Symbol(symbol) => current = symbol.function?,
                Object::Module(function) => return Some(f(&heap, function)),
                _ => return None,
            }
        }
        None
    }

    /// Docstring of the module function bound to `name`
    #[must_use]
    pub fn function_doc(&self, name: &str) -> Option<String> {
        self.module_function(name, |_, function| function.doc.clone())
    }

    /// Printed interactive spec of the module function bound to `name`
    #[must_use]
    pub fn interactive_spec(&self, name: &str) -> Option<String> {
        self.module_function(name, |heap, function| {
            function.interactive.map(|spec| {
                let mut out = String::new();
                builtins::prin1(heap, spec, &mut out);
                out
            })
        })
        .flatten()
    }

    /// Pending exit as `(SYMBOL . DATA)` printed, if any
    #[must_use]
    pub fn pending_exit(&self) -> Option<String> {
        let pending = self.host.pending.get()?;
        let mut heap = self.host.heap.borrow_mut();
        let pair = heap.cons(pending.first, pending.second);
        let mut out = String::new();
        builtins::prin1(&heap, pair, &mut out);
        Some(out)
    }

    /// Asks running module code to quit, as `C-g` would
    pub fn request_quit(&self) {
        self.host.quit.set(true);
    }

    /// Number of live global references
    #[must_use]
    pub fn global_refs(&self) -> usize {
        self.host.heap.borrow().global_refs.values().sum()
    }

    /// Runs and forgets every registered finalizer, as a collection would.
    ///
    /// Returns how many ran.
    pub fn run_finalizers(&self) -> usize {
        let mut due = Vec::new();
        for object in self.host.heap.borrow_mut().objects_mut() {
            match object {
                Object::UserPtr { ptr, finalizer } => {
                    if let Some(finalizer) = finalizer.take() {
                        due.push((finalizer, *ptr));
                    }
                }
                Object::Module(function) => {
                    if let Some(finalizer) = function.finalizer.take() {
                        due.push((finalizer, function.data));
                    }
                }
                _ => {}
            }
        }
        for &(finalizer, data) in &due {
            // SAFETY: the finalizer was registered for exactly this pointer.
            unsafe { finalizer(data) };
        }
        due.len()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: the environment table is owned by `self`.
        let size = unsafe { (*self.env).size };
        f.debug_struct("MockHost").field("env_size", &size).field("features", &self.features()).finish()
    }
}

impl Drop for MockHost {
    fn drop(&mut self) {
        self.run_finalizers();
        // SAFETY: both tables came from `Box::into_raw` in the constructor
        // and nothing else frees them.
        unsafe {
            drop(Box::from_raw(self.runtime));
            drop(Box::from_raw(self.env));
        }
    }
}
