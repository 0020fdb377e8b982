// EMB - emb-sys
// Module: Host ABI
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Raw declarations of the Emacs dynamic module ABI.
//!
//! The host hands a module two tables of C function pointers: the
//! [`emacs_runtime`] passed to `emacs_module_init`, and an [`emacs_env`] per
//! call. Both start with their own `size`, which grows as hosts add entries.
//! A binding must read that size before touching any entry introduced after
//! Emacs 25; see [`HostVersion`].
//!
//! Everything here mirrors `emacs-module.h` field for field. Nothing is safe
//! to call directly; `emb-host` wraps these tables.

use core::ffi::{c_char, c_int, c_void};

pub use libc::{intmax_t, ptrdiff_t, timespec};

mod version;

pub use version::{ENV_SIZE_25, ENV_SIZE_26, ENV_SIZE_27, ENV_SIZE_28, HostVersion, RUNTIME_SIZE};

/// Opaque host object
#[repr(C)]
pub struct emacs_value_tag {
    _private: [u8; 0],
}

/// Handle to a host value, valid for the dynamic extent of one call
pub type emacs_value = *mut emacs_value_tag;

/// Opaque runtime-private state
#[repr(C)]
pub struct emacs_runtime_private {
    _private: [u8; 0],
}

/// Opaque environment-private state
#[repr(C)]
pub struct emacs_env_private {
    _private: [u8; 0],
}

/// Outcome of a host call, as returned by `non_local_exit_check`
pub type emacs_funcall_exit = c_int;
/// Normal return
pub const emacs_funcall_exit_return: emacs_funcall_exit = 0;
/// A signal (error) is pending
pub const emacs_funcall_exit_signal: emacs_funcall_exit = 1;
/// A `throw` to a catch tag is pending
pub const emacs_funcall_exit_throw: emacs_funcall_exit = 2;

/// Answer of `process_input`
pub type emacs_process_input_result = c_int;
/// Keep going
pub const emacs_process_input_continue: emacs_process_input_result = 0;
/// The user asked to quit
pub const emacs_process_input_quit: emacs_process_input_result = 1;

/// Maximum arity marking a function that accepts any number of arguments
pub const emacs_variadic_function: ptrdiff_t = -2;

/// One limb of a big integer magnitude
pub type emacs_limb_t = usize;

/// Module function signature the host calls
pub type emacs_function = unsafe extern "C" fn(
    env: *mut emacs_env,
    nargs: ptrdiff_t,
    args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value;

/// Finalizer run by the host garbage collector
pub type emacs_finalizer = unsafe extern "C" fn(data: *mut c_void);

/// Signature of the exported module entry point
pub type emacs_module_init_fn = unsafe extern "C" fn(runtime: *mut emacs_runtime) -> c_int;

/// Name of the exported module entry point
pub const MODULE_INIT_SYMBOL: &str = "emacs_module_init";
/// Name of the licence marker symbol the host requires
pub const GPL_COMPATIBLE_SYMBOL: &str = "plugin_is_GPL_compatible";

/// Table passed to `emacs_module_init`
#[repr(C)]
pub struct emacs_runtime {
    /// Size of this table in bytes, as filled in by the host
    pub size: ptrdiff_t,
    /// Host-private state
    pub private_members: *mut emacs_runtime_private,
    /// Returns the environment for the running init call
    pub get_environment: unsafe extern "C" fn(runtime: *mut emacs_runtime) -> *mut emacs_env,
}

/// Per-call function table, complete up to Emacs 28
///
/// Entries are named and ordered as in `emacs-module.h`.
#[allow(missing_docs)]
#[repr(C)]
pub struct emacs_env {
    pub size: ptrdiff_t,
    pub private_members: *mut emacs_env_private,

    // Emacs 25
    pub make_global_ref: unsafe extern "C" fn(env: *mut emacs_env, value: emacs_value) -> emacs_value,
    pub free_global_ref: unsafe extern "C" fn(env: *mut emacs_env, global_value: emacs_value),
    pub non_local_exit_check: unsafe extern "C" fn(env: *mut emacs_env) -> emacs_funcall_exit,
    pub non_local_exit_clear: unsafe extern "C" fn(env: *mut emacs_env),
    pub non_local_exit_get: unsafe extern "C" fn(
        env: *mut emacs_env,
        symbol: *mut emacs_value,
        data: *mut emacs_value,
    ) -> emacs_funcall_exit,
    pub non_local_exit_signal:
        unsafe extern "C" fn(env: *mut emacs_env, symbol: emacs_value, data: emacs_value),
    pub non_local_exit_throw:
        unsafe extern "C" fn(env: *mut emacs_env, tag: emacs_value, value: emacs_value),
    pub make_function: unsafe extern "C" fn(
        env: *mut emacs_env,
        min_arity: ptrdiff_t,
        max_arity: ptrdiff_t,
        func: emacs_function,
        docstring: *const c_char,
        data: *mut c_void,
    ) -> emacs_value,
    pub funcall: unsafe extern "C" fn(
        env: *mut emacs_env,
        func: emacs_value,
        nargs: ptrdiff_t,
        args: *mut emacs_value,
    ) -> emacs_value,
    pub intern: unsafe extern "C" fn(env: *mut emacs_env, name: *const c_char) -> emacs_value,
    pub type_of: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> emacs_value,
    pub is_not_nil: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> bool,
    pub eq: unsafe extern "C" fn(env: *mut emacs_env, a: emacs_value, b: emacs_value) -> bool,
    pub extract_integer: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> intmax_t,
    pub make_integer: unsafe extern "C" fn(env: *mut emacs_env, n: intmax_t) -> emacs_value,
    pub extract_float: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> f64,
    pub make_float: unsafe extern "C" fn(env: *mut emacs_env, d: f64) -> emacs_value,
    pub copy_string_contents: unsafe extern "C" fn(
        env: *mut emacs_env,
        value: emacs_value,
        buf: *mut c_char,
        len: *mut ptrdiff_t,
    ) -> bool,
    pub make_string:
        unsafe extern "C" fn(env: *mut emacs_env, str: *const c_char, len: ptrdiff_t) -> emacs_value,
    pub make_user_ptr: unsafe extern "C" fn(
        env: *mut emacs_env,
        fin: Option<emacs_finalizer>,
        ptr: *mut c_void,
    ) -> emacs_value,
    pub get_user_ptr: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> *mut c_void,
    pub set_user_ptr: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value, ptr: *mut c_void),
    pub get_user_finalizer:
        unsafe extern "C" fn(env: *mut emacs_env, uptr: emacs_value) -> Option<emacs_finalizer>,
    pub set_user_finalizer:
        unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value, fin: Option<emacs_finalizer>),
    pub vec_get: unsafe extern "C" fn(env: *mut emacs_env, vec: emacs_value, i: ptrdiff_t) -> emacs_value,
    pub vec_set:
        unsafe extern "C" fn(env: *mut emacs_env, vec: emacs_value, i: ptrdiff_t, val: emacs_value),
    pub vec_size: unsafe extern "C" fn(env: *mut emacs_env, vec: emacs_value) -> ptrdiff_t,

    // Emacs 26
    pub should_quit: unsafe extern "C" fn(env: *mut emacs_env) -> bool,

    // Emacs 27
    pub process_input: unsafe extern "C" fn(env: *mut emacs_env) -> emacs_process_input_result,
    pub extract_time: unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> timespec,
    pub make_time: unsafe extern "C" fn(env: *mut emacs_env, time: timespec) -> emacs_value,
    pub extract_big_integer: unsafe extern "C" fn(
        env: *mut emacs_env,
        arg: emacs_value,
        sign: *mut c_int,
        count: *mut ptrdiff_t,
        magnitude: *mut emacs_limb_t,
    ) -> bool,
    pub make_big_integer: unsafe extern "C" fn(
        env: *mut emacs_env,
        sign: c_int,
        count: ptrdiff_t,
        magnitude: *const emacs_limb_t,
    ) -> emacs_value,

    // Emacs 28
    pub get_function_finalizer:
        unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value) -> Option<emacs_finalizer>,
    pub set_function_finalizer:
        unsafe extern "C" fn(env: *mut emacs_env, arg: emacs_value, fin: Option<emacs_finalizer>),
    pub open_channel: unsafe extern "C" fn(env: *mut emacs_env, pipe_process: emacs_value) -> c_int,
    pub make_interactive:
        unsafe extern "C" fn(env: *mut emacs_env, function: emacs_value, spec: emacs_value),
    pub make_unibyte_string:
        unsafe extern "C" fn(env: *mut emacs_env, str: *const c_char, len: ptrdiff_t) -> emacs_value,
}
