// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Safe bridge between Rust and the Emacs dynamic module interface.
//!
//! The host calls into a module through a fixed C ABI and hands it a table of
//! function pointers. This crate wraps that table so module code never sees a
//! raw pointer and never unwinds into host frames:
//!
//! - [`Env`] is the per-call session. Every host primitive is reached through
//!   it and answers with an [`Expected`], whose error side is a captured
//!   non-local exit ([`Error`]).
//! - [`Value`] is a session-bound handle to a host object. [`GlobalRef`]
//!   outlives the session and must be freed explicitly.
//! - [`IntoLisp`] and [`FromLisp`] form the conversion table between Rust
//!   types and host values.
//! - [`Defun`] describes a function to export in one of three shapes (raw,
//!   wrapped, universal). [`DefunRegistry`] binds them at module init, behind
//!   trampolines that turn panics and faults into host signals.
//!
//! # Example
//!
//! ```no_run
//! use emb_host::prelude::*;
//!
//! fn add(_env: &Env, a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! fn register(registry: &mut DefunRegistry) {
//!     registry.add(Defun::universal("my-add", "Add two integers.", add));
//! }
//!
//! emb_host::emacs_module!(ModuleBuilder::new("my-module").build(), register);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod convert;
pub mod env;
pub mod error;
pub mod function;
pub mod lisp_type;
pub mod logging;
pub mod module;
pub mod prelude;
pub mod registry;
pub mod time;
mod trampoline;
pub mod value;

pub use emb_error::{BadExpectedAccess, Expected, Fault, FaultKind, Unexpected, emb_try};
pub use emb_sys as sys;

pub use convert::{Callable, FromLisp, IntoLisp, IntoLispArgs};
pub use env::{Env, Imported};
pub use error::{Error, FuncallExit, ProcessInputResult};
pub use function::{Defun, Rebind, SessionFn, UniversalFn, WrappedFn};
pub use lisp_type::LispType;
pub use logging::LoggingExt;
pub use module::{ModuleBuilder, ModuleConfig, init_module};
pub use registry::DefunRegistry;
pub use sys::HostVersion;
pub use time::Timestamp;
pub use value::{Finalizer, GlobalRef, Value};

/// Result of any operation that calls into the host.
///
/// The error side is the host's non-local exit, captured and cleared.
pub type LispResult<'e, T> = Expected<T, Error<'e>>;
