//! # EMB Logging
//!
//! Logging infrastructure for the Emacs module bridge.
//!
//! Module code logs through the [`log`] facade. Inside a dynamic module there
//! is no terminal to print to, so this crate collects records in a bounded
//! in-memory buffer ([`HostLogger`]). The host side of the bridge drains that
//! buffer into the `*Messages*` buffer or hands it to Lisp on request.

// EMB - emb-logging
// Module: Logging Infrastructure
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)] // Rule 2
#![warn(missing_docs)]

/// Bounded storage for log operations.
pub mod buffer;

/// Log level definitions for categorizing message severity.
///
/// This module defines the different log levels supported by the logging
/// infrastructure, from Trace (lowest severity) to Critical (highest severity).
pub mod level;

/// The `log::Log` implementation installed by modules.
pub mod logger;

/// Log operation data structures and utilities.
///
/// This module contains the types and functions for creating and working
/// with log operations, which encapsulate log messages and their metadata.
pub mod operation;

pub use buffer::LogBuffer;
pub use level::{LogLevel, ParseLogLevelError};
pub use logger::{HostLogger, install, installed};
pub use operation::LogOperation;

/// Default number of records kept before the oldest are dropped
pub const DEFAULT_CAPACITY: usize = 256;
