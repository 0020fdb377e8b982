// EMB - emb-error
// Module: EMB Error Prelude
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for emb-error
//!
//! Re-exports the types most modules of the bridge need, so crates can write
//! `use emb_error::prelude::*;`.

pub use crate::{
    BadExpectedAccess, Expected, Fault, FaultKind, FaultKinds, FaultResult, Unexpected, codes,
    emb_try, fault,
};
