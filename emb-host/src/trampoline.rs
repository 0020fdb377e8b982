// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Entry points the host calls for wrapped and universal functions.
//!
//! Nothing may unwind out of these functions. Every call runs under
//! `catch_unwind`, and a trapped panic is reported to the host as a signal
//! picked from its payload:
//!
//! | Payload | Signal |
//! |---|---|
//! | [`Fault`] | by kind, in catch order (`overflow-error`, `underflow-error`, `range-error`, `out-of-range`, `memory-full`, `convert-error`, `error`) |
//! | [`BadExpectedAccess`] | `convert-error` for universal functions, `error` otherwise |
//! | `&str`, `String` | `error` with the panic message |
//! | anything else | `error` with `"unknown error"` |

use std::{
    any::Any,
    ffi::{CStr, c_void},
    mem,
    panic::{self, AssertUnwindSafe},
    ptr, slice, thread,
};

use emb_error::{BadExpectedAccess, Expected, Fault};
use emb_sys::{emacs_env, emacs_value, ptrdiff_t};

use crate::{Env, LispResult, UniversalFn, Value, WrappedFn};

/// Which trampoline trapped a panic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Wrapped,
    Universal,
}

/// Signal symbol and message for a trapped panic payload
pub(crate) fn classify(payload: &(dyn Any + Send), shape: Shape) -> (&'static CStr, String) {
    if let Some(fault) = payload.downcast_ref::<Fault>() {
        (fault.signal_symbol(), fault.message().to_owned())
    } else if let Some(bad) = payload.downcast_ref::<BadExpectedAccess>() {
        let symbol = match shape {
            Shape::Universal => c"convert-error",
            Shape::Wrapped => c"error",
        };
        (symbol, bad.message().to_owned())
    } else if let Some(message) = payload.downcast_ref::<&'static str>() {
        (c"error", (*message).to_owned())
    } else if let Some(message) = payload.downcast_ref::<String>() {
        (c"error", message.clone())
    } else {
        (c"error", "unknown error".to_owned())
    }
}

unsafe fn arguments<'e>(env: &'e Env, nargs: ptrdiff_t, args: *mut emacs_value) -> Vec<Value<'e>> {
    let len = usize::try_from(nargs).unwrap_or(0);
    if len == 0 || args.is_null() {
        return Vec::new();
    }
    // SAFETY: the host passes `nargs` valid handles at `args`.
    let raw = unsafe { slice::from_raw_parts(args, len) };
    raw.iter().map(|&raw| Value::new(raw, env)).collect()
}

fn finish(env: &Env, outcome: thread::Result<LispResult<'_, Value<'_>>>, shape: Shape) -> emacs_value {
    match outcome {
        Ok(Expected::Value(value)) => value.raw(),
        Ok(Expected::Unexpected(error)) => {
            env.non_local_exit(&error);
            ptr::null_mut()
        }
        Err(payload) => {
            let (symbol, message) = classify(payload.as_ref(), shape);
            log::debug!("trapped panic reported as {}: {message}", symbol.to_string_lossy());
            let error = env.make_error(symbol, &message);
            env.signal_error(&error);
            ptr::null_mut()
        }
    }
}

/// Host entry point of every [`WrappedFn`]; `data` holds the function pointer
pub(crate) unsafe extern "C" fn wrapped(
    env: *mut emacs_env,
    nargs: ptrdiff_t,
    args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value {
    // SAFETY: `data` was cast from a `WrappedFn` by `Env::make_wrapped_function`.
    let func = unsafe { mem::transmute::<*mut c_void, WrappedFn>(data) };
    // SAFETY: the host passes the live environment of this call.
    let env = unsafe { Env::from_raw(env) };
    // SAFETY: forwarded unchanged from the host.
    let args = unsafe { arguments(&env, nargs, args) };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| func(&env, &args)));
    finish(&env, outcome, Shape::Wrapped)
}

/// Host entry point of every [`UniversalFn`]; `data` holds the boxed closure
pub(crate) unsafe extern "C" fn universal<F, Sig>(
    env: *mut emacs_env,
    nargs: ptrdiff_t,
    args: *mut emacs_value,
    data: *mut c_void,
) -> emacs_value
where
    F: UniversalFn<Sig>,
{
    // SAFETY: `data` is the `Box<F>` leaked by `Env::make_universal_function`;
    // the host keeps it alive as long as the function exists.
    let func = unsafe { &*data.cast::<F>() };
    // SAFETY: the host passes the live environment of this call.
    let env = unsafe { Env::from_raw(env) };
    // SAFETY: forwarded unchanged from the host.
    let args = unsafe { arguments(&env, nargs, args) };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| func.invoke(&env, &args)));
    finish(&env, outcome, Shape::Universal)
}

/// Function finalizer releasing a universal closure
pub(crate) unsafe extern "C" fn drop_boxed<F>(data: *mut c_void) {
    // SAFETY: called once by the host collector with the pointer produced by
    // `Box::into_raw` in `Env::make_universal_function`.
    let dropped = panic::catch_unwind(AssertUnwindSafe(|| drop(unsafe { Box::from_raw(data.cast::<F>()) })));
    if dropped.is_err() {
        log::error!("panic while dropping a module function closure");
    }
}

#[cfg(test)]
mod tests {
    use emb_error::{FaultKind, fault};

    use super::*;

    fn trap(f: impl FnOnce()) -> Box<dyn Any + Send> {
        let hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let payload = panic::catch_unwind(AssertUnwindSafe(f)).unwrap_err();
        panic::set_hook(hook);
        payload
    }

    #[test]
    fn test_classify_faults() {
        let cases = [
            (FaultKind::Overflow, "overflow-error"),
            (FaultKind::Underflow, "underflow-error"),
            (FaultKind::Range, "range-error"),
            (FaultKind::OutOfRange, "out-of-range"),
            (FaultKind::MemoryFull, "memory-full"),
            (FaultKind::Convert, "convert-error"),
            (FaultKind::Other, "error"),
        ];
        for (kind, symbol) in cases {
            let payload = trap(|| panic::panic_any(Fault::new(kind, "boom")));
            let (got, message) = classify(payload.as_ref(), Shape::Wrapped);
            assert_eq!(got.to_str().unwrap(), symbol);
            assert_eq!(message, "boom");
        }
    }

    #[test]
    fn test_classify_prefers_catch_order() {
        let payload = trap(|| panic::panic_any(fault!(Range, "both").also(FaultKind::Overflow)));
        let (symbol, _) = classify(payload.as_ref(), Shape::Universal);
        assert_eq!(symbol, c"overflow-error");
    }

    #[test]
    fn test_classify_misuse_depends_on_shape() {
        let payload = trap(|| panic::panic_any(BadExpectedAccess::default()));
        assert_eq!(classify(payload.as_ref(), Shape::Universal).0, c"convert-error");
        assert_eq!(classify(payload.as_ref(), Shape::Wrapped).0, c"error");
    }

    #[test]
    fn test_classify_messages() {
        let payload = trap(|| panic!("plain"));
        assert_eq!(classify(payload.as_ref(), Shape::Wrapped), (c"error", "plain".to_owned()));

        let n = 3;
        let payload = trap(|| panic!("formatted {n}"));
        assert_eq!(classify(payload.as_ref(), Shape::Wrapped), (c"error", "formatted 3".to_owned()));

        let payload = trap(|| panic::panic_any(17_u32));
        assert_eq!(classify(payload.as_ref(), Shape::Wrapped), (c"error", "unknown error".to_owned()));
    }
}
