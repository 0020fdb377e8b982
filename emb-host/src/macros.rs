// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

/// Calls an entry of the environment table.
///
/// Callers must only name entries that exist in the host's declared table
/// (check `Env::require` first for anything newer than Emacs 25).
macro_rules! raw_call {
    ($env:expr, $name:ident $(, $arg:expr)* $(,)?) => {{
        let raw = $env.raw();
        // SAFETY: `raw` is the table the host handed to the current call and
        // the entry lies within the size it declared.
        unsafe { ((*raw).$name)(raw $(, $arg)*) }
    }};
}

/// Exports a dynamic module.
///
/// Expands to the two symbols the host looks up when loading a module:
/// `plugin_is_GPL_compatible` and `emacs_module_init`. The init function
/// evaluates `$config` (a [`ModuleConfig`](crate::ModuleConfig)), passes a
/// fresh [`DefunRegistry`](crate::DefunRegistry) to `$register`, and then
/// runs [`init_module`](crate::init_module).
///
/// # Examples
///
/// ```no_run
/// use emb_host::prelude::*;
///
/// fn register(registry: &mut DefunRegistry) {
///     registry.add(Defun::universal("hello", "Greet.", |_: &Env| "hello"));
/// }
///
/// emb_host::emacs_module!(ModuleBuilder::new("hello").build(), register);
/// ```
#[macro_export]
macro_rules! emacs_module {
    ($config:expr, $register:path $(,)?) => {
        #[doc(hidden)]
        #[unsafe(no_mangle)]
        #[allow(non_upper_case_globals)]
        pub static plugin_is_GPL_compatible: ::core::ffi::c_int = 0;

        /// Module entry point called by the host.
        ///
        /// # Safety
        ///
        /// `runtime` must be the runtime table the host passes at load time.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn emacs_module_init(
            runtime: *mut $crate::sys::emacs_runtime,
        ) -> ::core::ffi::c_int {
            // SAFETY: forwarded unchanged from the host.
            unsafe { $crate::init_module(runtime, $config, $register) }
        }
    };
}
