// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Example dynamic module.
//!
//! Build with `cargo build -p emb-demo --release` and load the resulting
//! shared object with `(module-load "libemb_demo.so")`. It provides the
//! `emb-demo` feature and exports one function of each shape:
//!
//! | Function                  | Shape     | Behavior                                   |
//! |---------------------------|-----------|--------------------------------------------|
//! | `emb-demo-not-nil-p`      | raw       | `t` unless the argument is `nil`           |
//! | `emb-demo-sum`            | wrapped   | sum of any number of integers              |
//! | `emb-demo-add`            | universal | sum of two integers                        |
//! | `emb-demo-greet`          | universal | greeting string, also an interactive command |
//! | `emb-demo-checked-div`    | universal | integer division, `range-error` on zero    |
//! | `emb-demo-fail`           | universal | panics with its argument                   |
//! | `emb-demo-make-counter`   | wrapped   | a new counter user pointer                 |
//! | `emb-demo-counter-incr`   | universal | increments a counter, returns the count    |
//! | `emb-demo-log`            | wrapped   | drains the module's log buffer             |
//!
//! Setting `EMB_LOG_LEVEL=debug` before loading keeps debug records too.

use std::{
    ffi::c_void,
    sync::atomic::{AtomicUsize, Ordering},
};

use emb_error::{Fault, fault};
use emb_host::{
    prelude::*,
    sys::{emacs_env, emacs_value, ptrdiff_t},
};

/// Feature provided once the module is loaded
pub const FEATURE: &str = "emb-demo";

static LIVE_COUNTERS: AtomicUsize = AtomicUsize::new(0);

/// Counters made by `emb-demo-make-counter` not yet collected by the host
pub fn live_counters() -> usize {
    LIVE_COUNTERS.load(Ordering::SeqCst)
}

unsafe extern "C" fn not_nil_p(
    env: *mut emacs_env,
    _nargs: ptrdiff_t,
    args: *mut emacs_value,
    _data: *mut c_void,
) -> emacs_value {
    // SAFETY: the host passes a live table and enforces the arity of one.
    unsafe {
        let answer = if ((*env).is_not_nil)(env, *args) { c"t" } else { c"nil" };
        ((*env).intern)(env, answer.as_ptr())
    }
}

fn sum<'e>(env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
    let mut total = 0_i64;
    for arg in args {
        let n = emb_try!(arg.as_integer());
        total = match total.checked_add(n) {
            Some(total) => total,
            None => return Expected::Unexpected(env.fault_error(&Fault::overflow("sum overflows"))),
        };
    }
    log::debug!("summed {} integer(s)", args.len());
    env.make_integer(total)
}

fn add(_env: &Env, a: i64, b: i64) -> Result<i64, Fault> {
    a.checked_add(b).ok_or_else(|| fault!(Overflow, "{} + {} overflows", a, b))
}

fn greet(_env: &Env, name: String) -> String {
    format!("Hello, {name}!")
}

fn checked_div(_env: &Env, dividend: i64, divisor: i64) -> Result<i64, Fault> {
    dividend.checked_div(divisor).ok_or_else(|| fault!(Range, "cannot divide {} by {}", dividend, divisor))
}

fn fail(_env: &Env, message: String) -> i64 {
    panic!("{message}")
}

unsafe extern "C" fn free_counter(ptr: *mut c_void) {
    if !ptr.is_null() {
        // SAFETY: counters are only made by `make_counter`, from `Box::into_raw`.
        drop(unsafe { Box::from_raw(ptr.cast::<i64>()) });
        LIVE_COUNTERS.fetch_sub(1, Ordering::SeqCst);
    }
}

fn make_counter<'e>(env: &'e Env, _args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
    let ptr = Box::into_raw(Box::new(0_i64)).cast::<c_void>();
    match env.make_user_ptr(ptr, Some(free_counter)) {
        Expected::Value(value) => {
            LIVE_COUNTERS.fetch_add(1, Ordering::SeqCst);
            Expected::Value(value)
        }
        Expected::Unexpected(error) => {
            // SAFETY: the host did not take ownership.
            drop(unsafe { Box::from_raw(ptr.cast::<i64>()) });
            Expected::Unexpected(error)
        }
    }
}

fn counter_incr(_env: &Env, counter: *mut c_void) -> Result<i64, Fault> {
    if counter.is_null() {
        return Err(Fault::convert("counter was already freed"));
    }
    // SAFETY: non-null user pointers passed here come from `make_counter` and
    // stay alive until the host runs `free_counter`.
    let count = unsafe { &mut *counter.cast::<i64>() };
    *count = count.checked_add(1).ok_or_else(|| Fault::overflow("counter overflows"))?;
    Ok(*count)
}

fn setup(env: &Env) -> LispResult<'_, ()> {
    env.defvar("emb-demo-version", env!("CARGO_PKG_VERSION"), "Version of the emb-demo module.")
}

/// Adds every exported function to `registry`
pub fn register(registry: &mut DefunRegistry) {
    registry
        .add(Defun::raw(
            "emb-demo-not-nil-p",
            "Return t if OBJECT is not nil.\n\n(fn OBJECT)",
            1,
            Some(1),
            not_nil_p,
            std::ptr::null_mut(),
        ))
        .add(Defun::wrapped("emb-demo-sum", "Return the sum of integer arguments.", 0, None, sum))
        .add(Defun::universal("emb-demo-add", "Return A plus B.\n\n(fn A B)", add))
        .add(Defun::universal("emb-demo-greet", "Return a greeting for NAME.\n\n(fn NAME)", greet).interactive("sName: "))
        .add(Defun::universal(
            "emb-demo-checked-div",
            "Divide DIVIDEND by DIVISOR, signaling range-error on zero.\n\n(fn DIVIDEND DIVISOR)",
            checked_div,
        ))
        .add(Defun::universal("emb-demo-fail", "Signal an error with MESSAGE.\n\n(fn MESSAGE)", fail))
        .add(Defun::wrapped("emb-demo-make-counter", "Return a new counter.", 0, Some(0), make_counter))
        .add(Defun::universal(
            "emb-demo-counter-incr",
            "Increment COUNTER and return its count.\n\n(fn COUNTER)",
            counter_incr,
        ))
        .register_log_drain("emb-demo-log");
}

/// Module configuration, with the log level taken from `EMB_LOG_LEVEL`
pub fn config() -> ModuleConfig {
    ModuleBuilder::new(FEATURE).from_env().with_setup(setup).build()
}

emb_host::emacs_module!(config(), register);
