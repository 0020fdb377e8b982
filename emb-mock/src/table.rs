// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The `emacs_env` function table of the fake host.
//!
//! Like a real host, every entry that can fail does nothing and returns a
//! zero value while a non-local exit is pending.

use std::{
    ffi::{CStr, c_char, c_int, c_void},
    ptr, slice,
};

use emb_sys::{
    emacs_env, emacs_finalizer, emacs_funcall_exit, emacs_funcall_exit_return, emacs_function,
    emacs_limb_t, emacs_process_input_continue, emacs_process_input_quit,
    emacs_process_input_result, emacs_value, emacs_variadic_function, intmax_t, ptrdiff_t,
    timespec,
};

use crate::{
    heap::{ModuleFunction, Object},
    host::{Host, Pending},
};

const NANOS_PER_SEC: i64 = 1_000_000_000;

unsafe fn host<'a>(env: *mut emacs_env) -> &'a Host {
    // SAFETY: every table this crate builds points its private members at
    // the owning host, which outlives the table.
    unsafe { &*(*env).private_members.cast::<Host>() }
}

/// Runs `body` unless an exit is pending; a failure becomes the pending exit
unsafe fn guarded<T>(env: *mut emacs_env, fallback: T, body: impl FnOnce(&Host) -> Result<T, Pending>) -> T {
    // SAFETY: forwarded from the caller.
    let host = unsafe { host(env) };
    if host.pending.get().is_some() {
        return fallback;
    }
    match body(host) {
        Ok(value) => value,
        Err(pending) => {
            host.raise(pending);
            fallback
        }
    }
}

unsafe fn bytes_arg<'a>(data: *const c_char, len: ptrdiff_t) -> Option<&'a [u8]> {
    let len = usize::try_from(len).ok()?;
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    // SAFETY: the caller passes `len` readable bytes.
    Some(unsafe { slice::from_raw_parts(data.cast::<u8>(), len) })
}

unsafe extern "C" fn make_global_ref(env: *mut emacs_env, value: emacs_value) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let id = host.value(value)?;
            *host.heap.borrow_mut().global_refs.entry(id).or_insert(0) += 1;
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn free_global_ref(env: *mut emacs_env, value: emacs_value) {
    unsafe {
        guarded(env, (), |host| {
            let id = host.value(value)?;
            let mut heap = host.heap.borrow_mut();
            if let Some(count) = heap.global_refs.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    heap.global_refs.remove(&id);
                }
            }
            Ok(())
        });
    }
}

unsafe extern "C" fn non_local_exit_check(env: *mut emacs_env) -> emacs_funcall_exit {
    // SAFETY: forwarded from the caller.
    let host = unsafe { host(env) };
    host.pending.get().map_or(emacs_funcall_exit_return, |pending| pending.status)
}

unsafe extern "C" fn non_local_exit_clear(env: *mut emacs_env) {
    // SAFETY: forwarded from the caller.
    unsafe { host(env) }.pending.set(None);
}

unsafe extern "C" fn non_local_exit_get(
    env: *mut emacs_env,
    symbol: *mut emacs_value,
    data: *mut emacs_value,
) -> emacs_funcall_exit {
    // SAFETY: forwarded from the caller.
    let host = unsafe { host(env) };
    match host.pending.get() {
        Some(pending) => {
            // SAFETY: the caller passes two writable slots.
            unsafe {
                *symbol = host.handle(pending.first);
                *data = host.handle(pending.second);
            }
            pending.status
        }
        None => emacs_funcall_exit_return,
    }
}

unsafe extern "C" fn non_local_exit_signal(env: *mut emacs_env, symbol: emacs_value, data: emacs_value) {
    unsafe {
        guarded(env, (), |host| {
            let pending = host.signal_with(host.value(symbol)?, host.value(data)?);
            host.raise(pending);
            Ok(())
        });
    }
}

unsafe extern "C" fn non_local_exit_throw(env: *mut emacs_env, tag: emacs_value, value: emacs_value) {
    unsafe {
        guarded(env, (), |host| {
            let pending = host.throw(host.value(tag)?, host.value(value)?);
            host.raise(pending);
            Ok(())
        });
    }
}

unsafe extern "C" fn make_function(
    env: *mut emacs_env,
    min_arity: ptrdiff_t,
    max_arity: ptrdiff_t,
    func: emacs_function,
    docstring: *const c_char,
    data: *mut c_void,
) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            if min_arity < 0 || (max_arity != emacs_variadic_function && max_arity < min_arity) {
                let mut heap = host.heap.borrow_mut();
                let (min, max) = (heap.int(min_arity as i64), heap.int(max_arity as i64));
                drop(heap);
                return Err(host.signal("invalid-arity", &[min, max]));
            }
            let doc = if docstring.is_null() {
                String::new()
            } else {
                CStr::from_ptr(docstring).to_string_lossy().into_owned()
            };
            let id = host.heap.borrow_mut().alloc(Object::Module(ModuleFunction {
                min: min_arity,
                max: max_arity,
                func,
                data,
                doc,
                finalizer: None,
                interactive: None,
            }));
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn funcall(
    env: *mut emacs_env,
    function: emacs_value,
    nargs: ptrdiff_t,
    args: *mut emacs_value,
) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let function = host.value(function)?;
            let len = usize::try_from(nargs).map_err(|_| host.error("negative argument count"))?;
            let raw = if len == 0 { &[][..] } else { slice::from_raw_parts(args, len) };
            let mut ids = Vec::with_capacity(len);
            for &arg in raw {
                ids.push(host.value(arg)?);
            }
            let result = host.funcall(function, &ids)?;
            Ok(host.handle(result))
        })
    }
}

unsafe extern "C" fn intern(env: *mut emacs_env, name: *const c_char) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            if name.is_null() {
                return Err(host.error("null symbol name"));
            }
            let name = CStr::from_ptr(name).to_string_lossy();
            let id = host.heap.borrow_mut().intern(&name);
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn type_of(env: *mut emacs_env, value: emacs_value) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let id = host.value(value)?;
            let mut heap = host.heap.borrow_mut();
            let name = heap.get(id).map_or("symbol", Object::type_name);
            let symbol = heap.intern(name);
            Ok(heap.handle(symbol))
        })
    }
}

unsafe extern "C" fn is_not_nil(env: *mut emacs_env, value: emacs_value) -> bool {
    unsafe { guarded(env, false, |host| Ok(host.value(value)? != host.nil())) }
}

unsafe extern "C" fn eq(env: *mut emacs_env, a: emacs_value, b: emacs_value) -> bool {
    unsafe { guarded(env, false, |host| Ok(host.value(a)? == host.value(b)?)) }
}

unsafe extern "C" fn extract_integer(env: *mut emacs_env, value: emacs_value) -> intmax_t {
    unsafe { guarded(env, 0, |host| host.int_value(host.value(value)?)) }
}

unsafe extern "C" fn make_integer(env: *mut emacs_env, n: intmax_t) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let id = host.heap.borrow_mut().int(n);
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn extract_float(env: *mut emacs_env, value: emacs_value) -> f64 {
    unsafe {
        guarded(env, 0.0, |host| {
            let id = host.value(value)?;
            let d = match host.heap.borrow().get(id) {
                Some(Object::Float(d)) => Some(*d),
                _ => None,
            };
            d.ok_or_else(|| host.wrong_type("floatp", id))
        })
    }
}

unsafe extern "C" fn make_float(env: *mut emacs_env, d: f64) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let id = host.heap.borrow_mut().float(d);
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn copy_string_contents(
    env: *mut emacs_env,
    value: emacs_value,
    buf: *mut c_char,
    len: *mut ptrdiff_t,
) -> bool {
    unsafe {
        guarded(env, false, |host| {
            let id = host.value(value)?;
            let bytes = match host.heap.borrow().get(id) {
                Some(Object::Str { bytes, .. }) => Some(bytes.clone()),
                _ => None,
            };
            let bytes = bytes.ok_or_else(|| host.wrong_type("stringp", id))?;
            let required = bytes.len() as ptrdiff_t + 1;
            if buf.is_null() {
                *len = required;
                return Ok(true);
            }
            if *len < required {
                let available = *len;
                *len = required;
                return Err(host.out_of_range(id, available as i64));
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), bytes.len());
            *buf.add(bytes.len()) = 0;
            *len = required;
            Ok(true)
        })
    }
}

unsafe extern "C" fn make_string(env: *mut emacs_env, data: *const c_char, len: ptrdiff_t) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let bytes = bytes_arg(data, len).ok_or_else(|| host.error("invalid string argument"))?;
            if std::str::from_utf8(bytes).is_err() {
                return Err(host.error("Invalid UTF-8 in module string"));
            }
            let id = host.heap.borrow_mut().string(bytes.to_vec(), true);
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn make_unibyte_string(
    env: *mut emacs_env,
    data: *const c_char,
    len: ptrdiff_t,
) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let bytes = bytes_arg(data, len).ok_or_else(|| host.error("invalid string argument"))?;
            let id = host.heap.borrow_mut().string(bytes.to_vec(), false);
            Ok(host.handle(id))
        })
    }
}

unsafe extern "C" fn make_user_ptr(
    env: *mut emacs_env,
    finalizer: Option<emacs_finalizer>,
    data: *mut c_void,
) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let id = host.heap.borrow_mut().alloc(Object::UserPtr { ptr: data, finalizer });
            Ok(host.handle(id))
        })
    }
}

fn with_user_ptr<T>(
    host: &Host,
    value: emacs_value,
    f: impl FnOnce(&mut *mut c_void, &mut Option<emacs_finalizer>) -> T,
) -> Result<T, Pending> {
    let id = host.value(value)?;
    let result = match host.heap.borrow_mut().get_mut(id) {
        Some(Object::UserPtr { ptr, finalizer }) => Some(f(ptr, finalizer)),
        _ => None,
    };
    result.ok_or_else(|| host.wrong_type("user-ptrp", id))
}

unsafe extern "C" fn get_user_ptr(env: *mut emacs_env, value: emacs_value) -> *mut c_void {
    unsafe { guarded(env, ptr::null_mut(), |host| with_user_ptr(host, value, |ptr, _| *ptr)) }
}

unsafe extern "C" fn set_user_ptr(env: *mut emacs_env, value: emacs_value, data: *mut c_void) {
    unsafe { guarded(env, (), |host| with_user_ptr(host, value, |ptr, _| *ptr = data)) }
}

unsafe extern "C" fn get_user_finalizer(env: *mut emacs_env, value: emacs_value) -> Option<emacs_finalizer> {
    unsafe { guarded(env, None, |host| with_user_ptr(host, value, |_, fin| *fin)) }
}

unsafe extern "C" fn set_user_finalizer(
    env: *mut emacs_env,
    value: emacs_value,
    finalizer: Option<emacs_finalizer>,
) {
    unsafe { guarded(env, (), |host| with_user_ptr(host, value, |_, fin| *fin = finalizer)) }
}

fn vector_slot(host: &Host, vector: emacs_value, index: ptrdiff_t) -> Result<(usize, usize), Pending> {
    let id = host.value(vector)?;
    let len = match host.heap.borrow().get(id) {
        Some(Object::Vector(items)) => Some(items.len()),
        _ => None,
    };
    let len = len.ok_or_else(|| host.wrong_type("vectorp", id))?;
    match usize::try_from(index) {
        Ok(i) if i < len => Ok((id, i)),
        _ => Err(host.out_of_range(id, index as i64)),
    }
}

unsafe extern "C" fn vec_get(env: *mut emacs_env, vector: emacs_value, index: ptrdiff_t) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let (id, i) = vector_slot(host, vector, index)?;
            let item = match host.heap.borrow().get(id) {
                Some(Object::Vector(items)) => items[i],
                _ => id,
            };
            Ok(host.handle(item))
        })
    }
}

unsafe extern "C" fn vec_set(env: *mut emacs_env, vector: emacs_value, index: ptrdiff_t, value: emacs_value) {
    unsafe {
        guarded(env, (), |host| {
            let (id, i) = vector_slot(host, vector, index)?;
            let value = host.value(value)?;
            if let Some(Object::Vector(items)) = host.heap.borrow_mut().get_mut(id) {
                items[i] = value;
            }
            Ok(())
        });
    }
}

unsafe extern "C" fn vec_size(env: *mut emacs_env, vector: emacs_value) -> ptrdiff_t {
    unsafe {
        guarded(env, 0, |host| {
            let id = host.value(vector)?;
            let len = match host.heap.borrow().get(id) {
                Some(Object::Vector(items)) => Some(items.len() as ptrdiff_t),
                _ => None,
            };
            len.ok_or_else(|| host.wrong_type("vectorp", id))
        })
    }
}

unsafe extern "C" fn should_quit(env: *mut emacs_env) -> bool {
    // SAFETY: forwarded from the caller.
    unsafe { host(env) }.quit.get()
}

unsafe extern "C" fn process_input(env: *mut emacs_env) -> emacs_process_input_result {
    // SAFETY: forwarded from the caller.
    let host = unsafe { host(env) };
    if host.pending.get().is_some() {
        return emacs_process_input_quit;
    }
    if host.quit.replace(false) {
        let quit = host.signal("quit", &[]);
        host.raise(quit);
        emacs_process_input_quit
    } else {
        emacs_process_input_continue
    }
}

unsafe extern "C" fn extract_time(env: *mut emacs_env, value: emacs_value) -> timespec {
    // SAFETY: timespec is plain old data.
    let zero: timespec = unsafe { std::mem::zeroed() };
    unsafe {
        guarded(env, zero, |host| {
            let id = host.value(value)?;
            let nanos = {
                let heap = host.heap.borrow();
                match heap.get(id) {
                    Some(Object::Int(secs)) => secs.checked_mul(NANOS_PER_SEC),
                    Some(Object::Float(secs)) => Some((secs * NANOS_PER_SEC as f64) as i64),
                    Some(Object::Cons(ticks, hz)) => match (heap.get(*ticks), heap.get(*hz)) {
                        (Some(Object::Int(ticks)), Some(Object::Int(hz))) if *hz > 0 => {
                            i64::try_from(i128::from(*ticks) * i128::from(NANOS_PER_SEC) / i128::from(*hz)).ok()
                        }
                        _ => None,
                    },
                    _ => None,
                }
            };
            let nanos = nanos.ok_or_else(|| host.error("Invalid time specification"))?;
            let mut time = zero;
            time.tv_sec = nanos.div_euclid(NANOS_PER_SEC) as _;
            time.tv_nsec = nanos.rem_euclid(NANOS_PER_SEC) as _;
            Ok(time)
        })
    }
}

unsafe extern "C" fn make_time(env: *mut emacs_env, time: timespec) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let ticks = i64::from(time.tv_sec)
                .checked_mul(NANOS_PER_SEC)
                .and_then(|ns| ns.checked_add(i64::from(time.tv_nsec)))
                .ok_or_else(|| host.signal("overflow-error", &[]))?;
            let mut heap = host.heap.borrow_mut();
            let (ticks, hz) = (heap.int(ticks), heap.int(NANOS_PER_SEC));
            let id = heap.cons(ticks, hz);
            Ok(heap.handle(id))
        })
    }
}

unsafe extern "C" fn extract_big_integer(
    env: *mut emacs_env,
    value: emacs_value,
    sign: *mut c_int,
    count: *mut ptrdiff_t,
    magnitude: *mut emacs_limb_t,
) -> bool {
    unsafe {
        guarded(env, false, |host| {
            let n = host.int_value(host.value(value)?)?;
            if !sign.is_null() {
                *sign = n.signum() as c_int;
            }
            let needed: ptrdiff_t = if n == 0 { 0 } else { 1 };
            if magnitude.is_null() {
                *count = needed;
                return Ok(true);
            }
            if *count < needed {
                *count = needed;
                return Err(host.signal("overflow-error", &[]));
            }
            *count = needed;
            if needed == 1 {
                *magnitude = n.unsigned_abs() as emacs_limb_t;
            }
            Ok(true)
        })
    }
}

unsafe extern "C" fn make_big_integer(
    env: *mut emacs_env,
    sign: c_int,
    count: ptrdiff_t,
    magnitude: *const emacs_limb_t,
) -> emacs_value {
    unsafe {
        guarded(env, ptr::null_mut(), |host| {
            let limbs = match usize::try_from(count) {
                Ok(0) => &[][..],
                Ok(n) if !magnitude.is_null() => slice::from_raw_parts(magnitude, n),
                _ => return Err(host.error("invalid big integer")),
            };
            let mut value: i128 = 0;
            for (i, &limb) in limbs.iter().enumerate() {
                if limb != 0 && i > 0 {
                    return Err(host.signal("overflow-error", &[]));
                }
                value += limb as i128;
            }
            if sign < 0 {
                value = -value;
            }
            let n = i64::try_from(value).map_err(|_| host.signal("overflow-error", &[]))?;
            let id = host.heap.borrow_mut().int(n);
            Ok(host.handle(id))
        })
    }
}

fn with_module_function<T>(
    host: &Host,
    value: emacs_value,
    f: impl FnOnce(&mut ModuleFunction) -> T,
) -> Result<T, Pending> {
    let id = host.value(value)?;
    let result = match host.heap.borrow_mut().get_mut(id) {
        Some(Object::Module(function)) => Some(f(function)),
        _ => None,
    };
    result.ok_or_else(|| host.wrong_type("module-function-p", id))
}

unsafe extern "C" fn get_function_finalizer(env: *mut emacs_env, value: emacs_value) -> Option<emacs_finalizer> {
    unsafe { guarded(env, None, |host| with_module_function(host, value, |function| function.finalizer)) }
}

unsafe extern "C" fn set_function_finalizer(
    env: *mut emacs_env,
    value: emacs_value,
    finalizer: Option<emacs_finalizer>,
) {
    unsafe {
        guarded(env, (), |host| {
            with_module_function(host, value, |function| function.finalizer = finalizer)
        });
    }
}

unsafe extern "C" fn open_channel(env: *mut emacs_env, process: emacs_value) -> c_int {
    unsafe {
        guarded(env, -1, |host| {
            let id = host.value(process)?;
            Err(host.wrong_type("processp", id))
        })
    }
}

unsafe extern "C" fn make_interactive(env: *mut emacs_env, function: emacs_value, spec: emacs_value) {
    unsafe {
        guarded(env, (), |host| {
            let spec = host.value(spec)?;
            with_module_function(host, function, |function| function.interactive = Some(spec))
        });
    }
}

/// A complete table whose private members point at `host`
pub(crate) fn env_table(size: ptrdiff_t, host: *mut Host) -> emacs_env {
    emacs_env {
        size,
        private_members: host.cast(),
        make_global_ref,
        free_global_ref,
        non_local_exit_check,
        non_local_exit_clear,
        non_local_exit_get,
        non_local_exit_signal,
        non_local_exit_throw,
        make_function,
        funcall,
        intern,
        type_of,
        is_not_nil,
        eq,
        extract_integer,
        make_integer,
        extract_float,
        make_float,
        copy_string_contents,
        make_string,
        make_user_ptr,
        get_user_ptr,
        set_user_ptr,
        get_user_finalizer,
        set_user_finalizer,
        vec_get,
        vec_set,
        vec_size,
        should_quit,
        process_input,
        extract_time,
        make_time,
        extract_big_integer,
        make_big_integer,
        get_function_finalizer,
        set_function_finalizer,
        open_channel,
        make_interactive,
        make_unibyte_string,
    }
}
