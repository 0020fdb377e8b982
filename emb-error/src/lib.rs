// EMB - emb-error
// Module: Expected Values and Native Faults
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error handling primitives for the Emacs module bridge.
//!
//! Nothing in this crate talks to the host. It provides the two vocabularies
//! the rest of the bridge is written in:
//!
//! - [`Expected<T, E>`], a two-variant result type with monadic combinators.
//!   Every call into the host answers with an `Expected` instead of unwinding
//!   across the C ABI.
//! - [`Fault`], the taxonomy of native runtime faults (overflow, underflow,
//!   range, out-of-range, allocation failure, conversion misuse). Trampolines
//!   translate faults into host signals at the ABI boundary.
//!
//! # Usage
//!
//! ```
//! use emb_error::{emb_try, Expected, Unexpected};
//!
//! fn parse(input: &str) -> Expected<i64, String> {
//!     input.parse::<i64>().map_err(|e| e.to_string()).into()
//! }
//!
//! fn double(input: &str) -> Expected<i64, String> {
//!     let value = emb_try!(parse(input));
//!     Expected::Value(value * 2)
//! }
//!
//! assert_eq!(double("21"), Expected::Value(42));
//! assert!(double("forty-two").has_error());
//! assert_eq!(
//!     Expected::<i64, _>::from(Unexpected::new("boom")).value_or(7),
//!     7
//! );
//! ```

#![forbid(unsafe_code)] // Rule 2
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

/// Numeric codes for native faults
pub mod codes;
/// The `Expected` result type
pub mod expected;
/// Native fault taxonomy
pub mod fault;

pub mod prelude;

#[macro_use]
pub mod macros;

pub use expected::{BadExpectedAccess, Expected, Unexpected};
pub use fault::{Fault, FaultKind, FaultKinds};

/// A specialized `Expected` whose error side is a native [`Fault`].
pub type FaultResult<T> = Expected<T, Fault>;
