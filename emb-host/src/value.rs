// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Session-bound and global handles to host objects.

use std::{ffi::c_void, fmt, ptr};

use emb_error::{Expected, Fault, emb_try};
use emb_sys::{HostVersion, emacs_finalizer, emacs_value, ptrdiff_t};

use crate::{Env, FromLisp, IntoLisp, IntoLispArgs, LispResult, Timestamp};
#[cfg(feature = "unstable-type-tag")]
use crate::LispType;

/// Finalizer the host garbage collector runs on a user pointer or function.
///
/// It runs outside any session: it must not call into the host, must not
/// panic, and should return quickly. Collection is not deterministic, so a
/// finalizer is no substitute for explicit cleanup.
pub type Finalizer = emacs_finalizer;

/// A host object, valid while the [`Env`] that produced it is live.
///
/// Copying a `Value` copies the handle, not the object. `==` compares host
/// identity (`eq`), so two strings with the same contents are usually not
/// equal; use [`Value::equal`] for structural comparison.
#[derive(Clone, Copy)]
pub struct Value<'e> {
    raw: emacs_value,
    env: &'e Env,
}

impl<'e> Value<'e> {
    /// Wraps a raw handle.
    ///
    /// # Safety
    ///
    /// `raw` must be a handle the host issued to `env`'s current call, or a
    /// global reference.
    #[must_use]
    pub const unsafe fn from_raw(raw: emacs_value, env: &'e Env) -> Self {
        Self { raw, env }
    }

    pub(crate) const fn new(raw: emacs_value, env: &'e Env) -> Self {
        Self { raw, env }
    }

    /// The raw handle
    #[must_use]
    pub const fn raw(&self) -> emacs_value {
        self.raw
    }

    /// The session this value belongs to
    #[must_use]
    pub const fn env(&self) -> &'e Env {
        self.env
    }

    /// The host's `type-of` answer, a symbol such as `integer` or `string`
    #[must_use]
    pub fn type_of(self) -> Value<'e> {
        Value::new(raw_call!(self.env, type_of, self.raw), self.env)
    }

    /// Reads the type tag out of the handle bits without a host call.
    ///
    /// Valid only for hosts that hand out object words as handles and use the
    /// tag layout described in [`crate::lisp_type`].
    #[cfg(feature = "unstable-type-tag")]
    #[must_use]
    pub fn lisp_type(self) -> LispType {
        LispType::from_word(self.raw as usize)
    }

    /// Whether the value is anything but `nil`
    #[must_use]
    pub fn is_not_nil(self) -> bool {
        raw_call!(self.env, is_not_nil, self.raw)
    }

    /// Whether the value is `nil`
    #[must_use]
    pub fn is_nil(self) -> bool {
        !self.is_not_nil()
    }

    /// Structural comparison through the host's `equal`
    pub fn equal(self, other: Value<'e>) -> LispResult<'e, bool> {
        self.env.call("equal", (self, other)).map(Value::is_not_nil)
    }

    /// Creates a reference that survives the current session
    pub fn make_global_ref(self) -> LispResult<'e, GlobalRef> {
        let raw = raw_call!(self.env, make_global_ref, self.raw);
        self.env.check(raw).map(|raw| GlobalRef { raw })
    }

    /// Name of a symbol
    pub fn symbol_name(self) -> LispResult<'e, String> {
        self.env.call("symbol-name", (self,)).and_then(Value::as_string)
    }

    /// Value of a symbol
    pub fn symbol_value(self) -> LispResult<'e, Value<'e>> {
        self.env.call("symbol-value", (self,))
    }

    /// Calls the value as a function
    pub fn call<A: IntoLispArgs<'e>>(self, args: A) -> LispResult<'e, Value<'e>> {
        self.env.call(self, args)
    }

    /// Number of elements of a vector
    pub fn vec_size(self) -> LispResult<'e, usize> {
        let size = raw_call!(self.env, vec_size, self.raw);
        emb_try!(self.env.check(()));
        self.env.convert_fault(usize::try_from(size).map_err(Fault::from))
    }

    /// Element `index` of a vector; out of range signals `args-out-of-range`
    pub fn vec_get(self, index: usize) -> LispResult<'e, Value<'e>> {
        let index = emb_try!(self.env.index(index));
        let raw = raw_call!(self.env, vec_get, self.raw, index);
        self.env.check(raw).map(|raw| Value::new(raw, self.env))
    }

    /// Stores `value` at `index`; out of range signals `args-out-of-range`
    pub fn vec_set<T: IntoLisp<'e>>(self, index: usize, value: T) -> LispResult<'e, ()> {
        let index = emb_try!(self.env.index(index));
        let value = emb_try!(value.into_lisp(self.env));
        raw_call!(self.env, vec_set, self.raw, index, value.raw);
        self.env.check(())
    }

    /// Host integer as `i64`
    pub fn as_integer(self) -> LispResult<'e, i64> {
        let n = raw_call!(self.env, extract_integer, self.raw);
        self.env.check(n)
    }

    /// Host float as `f64`
    pub fn as_float(self) -> LispResult<'e, f64> {
        let d = raw_call!(self.env, extract_float, self.raw);
        self.env.check(d)
    }

    /// Raw bytes of a host string.
    ///
    /// Probes the length first, then copies, and drops the single trailing
    /// NUL the host appends. Embedded NULs are kept.
    pub fn as_bytes(self) -> LispResult<'e, Vec<u8>> {
        let mut len: ptrdiff_t = 0;
        raw_call!(self.env, copy_string_contents, self.raw, ptr::null_mut(), &raw mut len);
        emb_try!(self.env.check(()));

        let capacity = emb_try!(self.env.convert_fault(usize::try_from(len).map_err(Fault::from)));
        let mut buf = vec![0u8; capacity];
        raw_call!(self.env, copy_string_contents, self.raw, buf.as_mut_ptr().cast(), &raw mut len);
        emb_try!(self.env.check(()));

        buf.truncate(usize::try_from(len).unwrap_or(0));
        if buf.last() == Some(&0) {
            buf.pop();
        }
        Expected::Value(buf)
    }

    /// Host string as UTF-8; invalid UTF-8 signals `convert-error`
    pub fn as_string(self) -> LispResult<'e, String> {
        let bytes = emb_try!(self.as_bytes());
        self.env.convert_fault(String::from_utf8(bytes).map_err(Fault::from))
    }

    /// Host time value as a signed timestamp (Emacs 27)
    pub fn as_time(self) -> LispResult<'e, Timestamp> {
        emb_try!(self.env.require(HostVersion::Emacs27, "extract_time"));
        let spec = raw_call!(self.env, extract_time, self.raw);
        emb_try!(self.env.check(()));
        let nanos = i128::from(spec.tv_sec) * 1_000_000_000 + i128::from(spec.tv_nsec);
        let time = Timestamp::from_nanos(nanos).ok_or_else(|| Fault::overflow("time out of range"));
        self.env.convert_fault(time)
    }

    /// Pointer wrapped by a user-pointer object
    pub fn as_user_ptr(self) -> LispResult<'e, *mut c_void> {
        let p = raw_call!(self.env, get_user_ptr, self.raw);
        self.env.check(p)
    }

    /// Converts into any type of the conversion table
    pub fn into_rust<T: FromLisp<'e>>(self) -> LispResult<'e, T> {
        T::from_lisp(self)
    }

    /// Replaces the pointer wrapped by a user-pointer object
    pub fn set_user_ptr(self, ptr: *mut c_void) -> LispResult<'e, ()> {
        raw_call!(self.env, set_user_ptr, self.raw, ptr);
        self.env.check(())
    }

    /// Finalizer of a user-pointer object
    pub fn user_finalizer(self) -> LispResult<'e, Option<Finalizer>> {
        let fin = raw_call!(self.env, get_user_finalizer, self.raw);
        self.env.check(fin)
    }

    /// Replaces the finalizer of a user-pointer object
    pub fn set_user_finalizer(self, fin: Option<Finalizer>) -> LispResult<'e, ()> {
        raw_call!(self.env, set_user_finalizer, self.raw, fin);
        self.env.check(())
    }

    /// Makes a module function a command with interactive `spec` (Emacs 28)
    pub fn make_interactive<T: IntoLisp<'e>>(self, spec: T) -> LispResult<'e, ()> {
        emb_try!(self.env.require(HostVersion::Emacs28, "make_interactive"));
        let spec = emb_try!(spec.into_lisp(self.env));
        raw_call!(self.env, make_interactive, self.raw, spec.raw);
        self.env.check(())
    }

    /// Finalizer of a module function (Emacs 28)
    pub fn function_finalizer(self) -> LispResult<'e, Option<Finalizer>> {
        emb_try!(self.env.require(HostVersion::Emacs28, "get_function_finalizer"));
        let fin = raw_call!(self.env, get_function_finalizer, self.raw);
        self.env.check(fin)
    }

    /// Replaces the finalizer of a module function (Emacs 28)
    pub fn set_function_finalizer(self, fin: Option<Finalizer>) -> LispResult<'e, ()> {
        emb_try!(self.env.require(HostVersion::Emacs28, "set_function_finalizer"));
        raw_call!(self.env, set_function_finalizer, self.raw, fin);
        self.env.check(())
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        raw_call!(self.env, eq, self.raw, other.raw)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:p})", self.raw)
    }
}

/// A host object kept alive across sessions.
///
/// Must be released with [`GlobalRef::free`] while some session is live.
/// Dropping it without freeing leaks the host object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GlobalRef {
    raw: emacs_value,
}

impl GlobalRef {
    /// An alias of the object usable within `env`
    #[must_use]
    pub const fn bind<'e>(&self, env: &'e Env) -> Value<'e> {
        Value::new(self.raw, env)
    }

    /// The raw handle
    #[must_use]
    pub const fn raw(&self) -> emacs_value {
        self.raw
    }

    /// Releases the reference
    pub fn free(self, env: &Env) {
        raw_call!(env, free_global_ref, self.raw);
    }
}
