// EMB - emb-error
// Module: Fault Codes
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Fault codes for EMB

/// Arithmetic overflow
pub const OVERFLOW: u16 = 1000;
/// Arithmetic underflow
pub const UNDERFLOW: u16 = 1001;
/// Value outside the range of the target representation
pub const RANGE: u16 = 1002;
/// Index or key outside the bounds of a container
pub const OUT_OF_RANGE: u16 = 1003;
/// Allocation failure
pub const MEMORY_FULL: u16 = 1004;
/// Wrong side of an `Expected` accessed, or a value could not be converted
pub const CONVERT: u16 = 1005;
/// Any other native failure
pub const OTHER: u16 = 1099;

/// Module init: runtime struct smaller than expected
pub const INIT_RUNTIME_TOO_SMALL: u16 = 2001;
/// Module init: environment struct smaller than the configured minimum
pub const INIT_ENV_TOO_SMALL: u16 = 2002;
/// Module init: a function failed to bind, or the setup hook failed
pub const INIT_BIND_FAILED: u16 = 2003;
/// Module init: the feature could not be provided
pub const INIT_PROVIDE_FAILED: u16 = 2004;
