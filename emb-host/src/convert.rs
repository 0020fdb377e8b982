// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Conversions between Rust types and host values.
//!
//! | Rust type | Host value |
//! |---|---|
//! | [`Value`], `&`[`GlobalRef`] | passed through |
//! | [`LispResult<T>`] | `T`, or the error reported as is (into the host only) |
//! | `bool` | `t` / `nil` |
//! | `()` | `nil` (into the host only) |
//! | `*mut c_void` | user pointer without finalizer |
//! | `f32`, `f64` | float |
//! | `&str`, `String` | multibyte string |
//! | [`Timestamp`] | time value (Emacs 27) |
//! | [`Duration`] | time value after the epoch (Emacs 27) |
//! | `i8`..`i64`, `u8`..`u64`, `isize`, `usize` | integer (`overflow-error` if it does not fit) |
//! | `Option<T>` | `nil` for `None` |
//! | `Result<T, Fault>` | the fault's signal for `Err` (into the host only) |
//!
//! Anything else is rejected at compile time.

use std::{ffi::c_void, time::Duration};

use emb_error::{Expected, Fault, emb_try};
use emb_sys::emacs_value;

use crate::{Env, GlobalRef, LispResult, Timestamp, Value};

/// Conversion of a Rust value into a host value
pub trait IntoLisp<'e> {
    /// Performs the conversion
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>>;
}

/// Conversion of a host value into a Rust value.
///
/// `'e` is the session the value belongs to; owned results implement this
/// for every session.
pub trait FromLisp<'e>: Sized {
    /// Performs the conversion
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self>;
}

/// Something [`Env::call`] can invoke: a function name, a function value or a
/// global reference to one
pub trait Callable<'e> {
    /// Resolves to a host function value
    fn into_function(self, env: &'e Env) -> LispResult<'e, Value<'e>>;
}

/// Argument list of [`Env::call`]: a tuple of [`IntoLisp`] values or a slice
/// of [`Value`]s
pub trait IntoLispArgs<'e> {
    /// Raw argument storage handed to `funcall`
    type Raw: AsMut<[emacs_value]>;

    /// Converts every argument, stopping at the first failure
    fn into_lisp_args(self, env: &'e Env) -> LispResult<'e, Self::Raw>;
}

impl<'e> IntoLisp<'e> for Value<'e> {
    fn into_lisp(self, _env: &'e Env) -> LispResult<'e, Value<'e>> {
        Expected::Value(self)
    }
}

impl<'e> IntoLisp<'e> for &GlobalRef {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        Expected::Value(self.bind(env))
    }
}

impl<'e, T: IntoLisp<'e>> IntoLisp<'e> for LispResult<'e, T> {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        self.and_then(|value| value.into_lisp(env))
    }
}

impl<'e> IntoLisp<'e> for bool {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        if self { env.t() } else { env.nil() }
    }
}

impl<'e> IntoLisp<'e> for () {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.nil()
    }
}

impl<'e> IntoLisp<'e> for *mut c_void {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_user_ptr(self, None)
    }
}

impl<'e> IntoLisp<'e> for f64 {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_float(self)
    }
}

impl<'e> IntoLisp<'e> for f32 {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_float(f64::from(self))
    }
}

impl<'e> IntoLisp<'e> for &str {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_string(self)
    }
}

impl<'e> IntoLisp<'e> for &String {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_string(self)
    }
}

impl<'e> IntoLisp<'e> for String {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_string(&self)
    }
}

impl<'e> IntoLisp<'e> for Timestamp {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.make_time(self)
    }
}

impl<'e> IntoLisp<'e> for Duration {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        let time = emb_try!(env.convert_fault(Timestamp::try_from(self)));
        env.make_time(time)
    }
}

impl<'e, T: IntoLisp<'e>> IntoLisp<'e> for Option<T> {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        match self {
            Some(value) => value.into_lisp(env),
            None => env.nil(),
        }
    }
}

impl<'e, T: IntoLisp<'e>> IntoLisp<'e> for Result<T, Fault> {
    fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        match self {
            Ok(value) => value.into_lisp(env),
            Err(fault) => Expected::Unexpected(env.fault_error(&fault)),
        }
    }
}

macro_rules! impl_integer {
    (lossless: $($t:ty),*) => {$(
        impl<'e> IntoLisp<'e> for $t {
            fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
                env.make_integer(i64::from(self))
            }
        }
    )*};
    (checked: $($t:ty),*) => {$(
        impl<'e> IntoLisp<'e> for $t {
            fn into_lisp(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
                let n = emb_try!(env.convert_fault(i64::try_from(self).map_err(Fault::from)));
                env.make_integer(n)
            }
        }
    )*};
}

impl_integer!(lossless: i8, i16, i32, i64, u8, u16, u32);
impl_integer!(checked: isize, u64, usize);

macro_rules! impl_from_integer {
    ($($t:ty),*) => {$(
        impl<'e> FromLisp<'e> for $t {
            fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
                let n = emb_try!(value.as_integer());
                value.env().convert_fault(<$t>::try_from(n).map_err(Fault::from))
            }
        }
    )*};
}

impl<'e> FromLisp<'e> for i64 {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_integer()
    }
}

impl_from_integer!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl<'e> FromLisp<'e> for f64 {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_float()
    }
}

impl<'e> FromLisp<'e> for f32 {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_float().map(|d| d as f32)
    }
}

impl<'e> FromLisp<'e> for String {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_string()
    }
}

impl<'e> FromLisp<'e> for Vec<u8> {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_bytes()
    }
}

impl<'e> FromLisp<'e> for bool {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        Expected::Value(value.is_not_nil())
    }
}

impl<'e> FromLisp<'e> for Timestamp {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_time()
    }
}

/// Times before the epoch signal `overflow-error`
impl<'e> FromLisp<'e> for Duration {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        let time = emb_try!(value.as_time());
        value.env().convert_fault(Duration::try_from(time))
    }
}

impl<'e> FromLisp<'e> for *mut c_void {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        value.as_user_ptr()
    }
}

impl<'e> FromLisp<'e> for Value<'e> {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        Expected::Value(value)
    }
}

impl<'e, T: FromLisp<'e>> FromLisp<'e> for Option<T> {
    fn from_lisp(value: Value<'e>) -> LispResult<'e, Self> {
        if value.is_nil() { Expected::Value(None) } else { T::from_lisp(value).map(Some) }
    }
}

impl<'e> Callable<'e> for &str {
    fn into_function(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        env.intern(self)
    }
}

impl<'e> Callable<'e> for Value<'e> {
    fn into_function(self, _env: &'e Env) -> LispResult<'e, Value<'e>> {
        Expected::Value(self)
    }
}

impl<'e> Callable<'e> for &GlobalRef {
    fn into_function(self, env: &'e Env) -> LispResult<'e, Value<'e>> {
        Expected::Value(self.bind(env))
    }
}

macro_rules! impl_into_lisp_args {
    ($n:literal; $($t:ident $i:tt),*) => {
        impl<'e, $($t: IntoLisp<'e>),*> IntoLispArgs<'e> for ($($t,)*) {
            type Raw = [emacs_value; $n];

            #[allow(unused_variables)]
            fn into_lisp_args(self, env: &'e Env) -> LispResult<'e, Self::Raw> {
                Expected::Value([$(emb_try!(self.$i.into_lisp(env)).raw()),*])
            }
        }
    };
}

impl_into_lisp_args!(0;);
impl_into_lisp_args!(1; A 0);
impl_into_lisp_args!(2; A 0, B 1);
impl_into_lisp_args!(3; A 0, B 1, C 2);
impl_into_lisp_args!(4; A 0, B 1, C 2, D 3);
impl_into_lisp_args!(5; A 0, B 1, C 2, D 3, E 4);
impl_into_lisp_args!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_into_lisp_args!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_into_lisp_args!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

impl<'e> IntoLispArgs<'e> for &[Value<'e>] {
    type Raw = Vec<emacs_value>;

    fn into_lisp_args(self, _env: &'e Env) -> LispResult<'e, Self::Raw> {
        Expected::Value(self.iter().map(Value::raw).collect())
    }
}

impl<'e> IntoLispArgs<'e> for Vec<Value<'e>> {
    type Raw = Vec<emacs_value>;

    fn into_lisp_args(self, env: &'e Env) -> LispResult<'e, Self::Raw> {
        self.as_slice().into_lisp_args(env)
    }
}

impl<'e, const N: usize> IntoLispArgs<'e> for [Value<'e>; N] {
    type Raw = [emacs_value; N];

    fn into_lisp_args(self, _env: &'e Env) -> LispResult<'e, Self::Raw> {
        Expected::Value(self.map(|value| value.raw()))
    }
}
