// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Prelude module for emb-host
//!
//! Re-exports what a module crate needs to define and register functions,
//! so it can start with `use emb_host::prelude::*;`.

pub use emb_error::{Expected, Fault, FaultKind, Unexpected, emb_try, fault};

pub use crate::{
    Defun, DefunRegistry, Env, Error, FromLisp, FuncallExit, GlobalRef, HostVersion, IntoLisp,
    LispResult, LoggingExt, ModuleBuilder, ModuleConfig, Timestamp, Value, init_module,
};
