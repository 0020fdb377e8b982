// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Descriptors for functions exported to the host.
//!
//! The host calls every module function through one fixed C signature. A
//! [`Defun`] describes a native function in one of three shapes and knows how
//! to adapt it to that signature:
//!
//! - [`Defun::raw`]: the function already has the host signature and is
//!   registered as is.
//! - [`Defun::wrapped`]: a [`WrappedFn`] taking the argument slice and
//!   answering with a [`LispResult`].
//! - [`Defun::universal`]: any closure `Fn(&Env, A1, .., An) -> R` whose
//!   arguments implement [`FromLisp`] and whose result implements
//!   [`IntoLisp`]; [`Value`] and [`LispResult`] work on both sides.
//!
//! Wrapped and universal functions run behind a trampoline that turns panics
//! into host signals.

use std::{ffi::c_void, fmt, marker::PhantomData, time::Duration};

use emb_error::{Expected, Fault, emb_try};
use emb_sys::{HostVersion, emacs_function};

use crate::{Env, Error, FromLisp, IntoLisp, LispResult, Timestamp, Value};

/// A native function over the raw argument slice.
///
/// Returning an error reports it to the host as a signal or throw. Panics are
/// trapped by the trampoline.
pub type WrappedFn = for<'e> fn(&'e Env, &[Value<'e>]) -> LispResult<'e, Value<'e>>;

/// A closure callable with host arguments converted to Rust types.
///
/// Implemented for every `Fn(&Env, A1, .., An) -> R` with `n <= 8`, where
/// each `Ai` implements [`FromLisp`] and `R` implements [`IntoLisp`].
/// Arguments and results may be bound to the calling session, as in
/// `fn first<'e>(env: &'e Env, list: Value<'e>) -> LispResult<'e, Value<'e>>`.
///
/// `Sig` is the signature `fn(A1, .., An) -> R` with session lifetimes
/// written as `'static`; it only serves to tell the implementations apart.
/// The function itself must accept every session, see [`SessionFn`].
pub trait UniversalFn<Sig>: 'static {
    /// Number of host arguments the function takes
    const ARITY: usize;

    /// Converts `args`, calls the function and converts its result.
    ///
    /// An argument count other than [`Self::ARITY`] signals
    /// `wrong-number-of-arguments`. An argument that does not convert signals
    /// `convert-error` with data `(message symbol data)`, where `symbol` and
    /// `data` describe the original conversion failure.
    fn invoke<'e>(&self, env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>>;
}

/// A type named with `'static` session lifetimes, moved to session `'e`.
///
/// Owned types map to themselves.
pub trait Rebind<'e> {
    /// The type as seen from session `'e`
    type Output;
}

impl<'e> Rebind<'e> for Value<'static> {
    type Output = Value<'e>;
}

impl<'e, T: Rebind<'e>> Rebind<'e> for LispResult<'static, T> {
    type Output = LispResult<'e, T::Output>;
}

impl<'e, T: Rebind<'e>> Rebind<'e> for Option<T> {
    type Output = Option<T::Output>;
}

impl<'e, T: Rebind<'e>> Rebind<'e> for Result<T, Fault> {
    type Output = Result<T::Output, Fault>;
}

macro_rules! impl_rebind_owned {
    ($($t:ty),*) => {$(
        impl<'e> Rebind<'e> for $t {
            type Output = $t;
        }
    )*};
}

impl_rebind_owned!(
    (), bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &'static str,
    Vec<u8>, Timestamp, Duration, *mut c_void
);

/// Call of a universal function in an arbitrary session.
///
/// Implemented for functions accepting `&'e Env` and the `'e` rebinding of
/// every type in `Sig`, for all `'e`. A function that could keep a session
/// value past its call does not qualify.
pub trait SessionFn<Sig> {
    /// Converts `args` and calls the function; `args` has the right length
    fn call_in<'e>(&self, env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>>;
}

fn arity_error<T>(env: &Env, arity: usize, given: usize) -> LispResult<'_, T> {
    let symbol = emb_try!(env.intern("wrong-number-of-arguments"));
    let data = emb_try!(env.list((arity, given)));
    Expected::Unexpected(Error::signal(symbol, data))
}

fn conversion_error<'e, T>(env: &'e Env, index: usize, cause: &Error<'e>) -> LispResult<'e, T> {
    let symbol = emb_try!(env.intern("convert-error"));
    let message = format!("argument {index} cannot be converted");
    let data = emb_try!(env.list((message, cause.symbol(), cause.data())));
    Expected::Unexpected(Error::signal(symbol, data))
}

fn argument<'e, T: FromLisp<'e>>(env: &'e Env, value: Value<'e>, index: usize) -> LispResult<'e, T> {
    T::from_lisp(value).or_else(|cause| conversion_error(env, index, &cause))
}

// `Sig` is inferred from the `&'static Env` instance of the function's
// signature; the call itself goes through the session-generic `SessionFn`.
macro_rules! impl_universal_fn {
    ($n:literal; $($a:ident $v:ident $i:literal),*) => {
        impl<Func, Ret, $($a),*> SessionFn<fn($($a),*) -> Ret> for Func
        where
            Func: for<'e> Fn(&'e Env, $(<$a as Rebind<'e>>::Output),*) -> <Ret as Rebind<'e>>::Output,
            Ret: for<'e> Rebind<'e>,
            for<'e> <Ret as Rebind<'e>>::Output: IntoLisp<'e>,
            $(
                $a: for<'e> Rebind<'e>,
                for<'e> <$a as Rebind<'e>>::Output: FromLisp<'e>,
            )*
        {
            #[allow(unused_variables)]
            fn call_in<'e>(&self, env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
                let &[$($v),*] = args else {
                    return arity_error(env, $n, args.len());
                };
                $(let $v: <$a as Rebind<'e>>::Output = emb_try!(argument(env, $v, $i));)*
                self(env, $($v),*).into_lisp(env)
            }
        }

        impl<Func, Ret, $($a),*> UniversalFn<fn($($a),*) -> Ret> for Func
        where
            Func: Fn(&'static Env, $($a),*) -> Ret + SessionFn<fn($($a),*) -> Ret> + 'static,
        {
            const ARITY: usize = $n;

            fn invoke<'e>(&self, env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
                if args.len() != Self::ARITY {
                    return arity_error(env, Self::ARITY, args.len());
                }
                <Self as SessionFn<fn($($a),*) -> Ret>>::call_in(self, env, args)
            }
        }
    };
}

impl_universal_fn!(0;);
impl_universal_fn!(1; A a 0);
impl_universal_fn!(2; A a 0, B b 1);
impl_universal_fn!(3; A a 0, B b 1, C c 2);
impl_universal_fn!(4; A a 0, B b 1, C c 2, D d 3);
impl_universal_fn!(5; A a 0, B b 1, C c 2, D d 3, E e 4);
impl_universal_fn!(6; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);
impl_universal_fn!(7; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6);
impl_universal_fn!(8; A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7);

/// Type-erased universal function, materialized once at bind time
trait MakeFunction {
    fn make<'e>(self: Box<Self>, env: &'e Env, doc: &str) -> LispResult<'e, Value<'e>>;
}

struct Universal<F, Sig> {
    func: F,
    _sig: PhantomData<Sig>,
}

impl<F, Sig> MakeFunction for Universal<F, Sig>
where
    F: UniversalFn<Sig>,
    Sig: 'static,
{
    fn make<'e>(self: Box<Self>, env: &'e Env, doc: &str) -> LispResult<'e, Value<'e>> {
        env.make_universal_function::<F, Sig>(self.func, doc)
    }
}

/// A boxed universal closure waiting to be bound
pub struct BoxedUniversal(Box<dyn MakeFunction>);

/// A function to bind under a host-visible name
pub enum Defun {
    /// Host-signature function registered verbatim
    Raw {
        /// Name the function is bound to
        name: String,
        /// Docstring
        doc: String,
        /// Minimum number of arguments
        min_arity: usize,
        /// Maximum number of arguments, `None` for variadic
        max_arity: Option<usize>,
        /// Entry point; must never unwind
        func: emacs_function,
        /// Data pointer handed to every call
        data: *mut c_void,
        /// Interactive spec, if the function is a command
        interactive: Option<String>,
    },
    /// [`WrappedFn`] behind the panic-trapping trampoline
    Wrapped {
        /// Name the function is bound to
        name: String,
        /// Docstring
        doc: String,
        /// Minimum number of arguments
        min_arity: usize,
        /// Maximum number of arguments, `None` for variadic
        max_arity: Option<usize>,
        /// The function
        func: WrappedFn,
        /// Interactive spec, if the function is a command
        interactive: Option<String>,
    },
    /// [`UniversalFn`] behind the converting trampoline
    Universal {
        /// Name the function is bound to
        name: String,
        /// Docstring
        doc: String,
        /// Exact number of arguments
        arity: usize,
        /// The boxed closure
        make: BoxedUniversal,
        /// Interactive spec, if the function is a command
        interactive: Option<String>,
    },
}

impl Defun {
    /// A function that already has the host signature.
    ///
    /// `func` receives `data` on every call and is responsible for never
    /// unwinding into the host.
    pub fn raw(
        name: impl Into<String>,
        doc: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        func: emacs_function,
        data: *mut c_void,
    ) -> Self {
        Self::Raw {
            name: name.into(),
            doc: doc.into(),
            min_arity,
            max_arity,
            func,
            data,
            interactive: None,
        }
    }

    /// A function over the raw argument slice
    pub fn wrapped(
        name: impl Into<String>,
        doc: impl Into<String>,
        min_arity: usize,
        max_arity: Option<usize>,
        func: WrappedFn,
    ) -> Self {
        Self::Wrapped { name: name.into(), doc: doc.into(), min_arity, max_arity, func, interactive: None }
    }

    /// A closure with converted arguments, taking exactly `F::ARITY` of them
    pub fn universal<F, Sig>(name: impl Into<String>, doc: impl Into<String>, func: F) -> Self
    where
        F: UniversalFn<Sig>,
        Sig: 'static,
    {
        Self::Universal {
            name: name.into(),
            doc: doc.into(),
            arity: F::ARITY,
            make: BoxedUniversal(Box::new(Universal::<F, Sig> { func, _sig: PhantomData })),
            interactive: None,
        }
    }

    /// Marks the function as a command with interactive `spec`.
    ///
    /// Takes effect on Emacs 28; older hosts bind a plain function.
    #[must_use]
    pub fn interactive(mut self, spec: impl Into<String>) -> Self {
        let slot = match &mut self {
            Self::Raw { interactive, .. }
            | Self::Wrapped { interactive, .. }
            | Self::Universal { interactive, .. } => interactive,
        };
        *slot = Some(spec.into());
        self
    }

    /// Name the function is bound to
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Raw { name, .. } | Self::Wrapped { name, .. } | Self::Universal { name, .. } => name,
        }
    }

    /// Docstring
    #[must_use]
    pub fn doc(&self) -> &str {
        match self {
            Self::Raw { doc, .. } | Self::Wrapped { doc, .. } | Self::Universal { doc, .. } => doc,
        }
    }

    /// Minimum and maximum argument count; `None` maximum means variadic
    #[must_use]
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Self::Raw { min_arity, max_arity, .. } | Self::Wrapped { min_arity, max_arity, .. } => {
                (*min_arity, *max_arity)
            }
            Self::Universal { arity, .. } => (*arity, Some(*arity)),
        }
    }

    /// Interactive spec, if any
    #[must_use]
    pub fn interactive_spec(&self) -> Option<&str> {
        match self {
            Self::Raw { interactive, .. }
            | Self::Wrapped { interactive, .. }
            | Self::Universal { interactive, .. } => interactive.as_deref(),
        }
    }

    /// Creates the host function and binds it to its name
    pub fn def(self, env: &Env) -> LispResult<'_, ()> {
        let (name, interactive, function) = match self {
            Self::Raw { name, doc, min_arity, max_arity, func, data, interactive } => {
                let function = env.make_raw_function(min_arity, max_arity, func, &doc, data);
                (name, interactive, function)
            }
            Self::Wrapped { name, doc, min_arity, max_arity, func, interactive } => {
                let function = env.make_wrapped_function(min_arity, max_arity, func, &doc);
                (name, interactive, function)
            }
            Self::Universal { name, doc, make, interactive, .. } => {
                let function = make.0.make(env, &doc);
                (name, interactive, function)
            }
        };
        let function = emb_try!(function);

        if let Some(spec) = interactive {
            if env.supports(HostVersion::Emacs28) {
                emb_try!(function.make_interactive(spec.as_str()));
            } else {
                log::warn!("{name}: interactive spec ignored on Emacs {}", env.version().major());
            }
        }

        log::debug!("defalias {name}");
        env.defalias(&name, function)
    }
}

impl fmt::Debug for Defun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Raw { .. } => "Raw",
            Self::Wrapped { .. } => "Wrapped",
            Self::Universal { .. } => "Universal",
        };
        f.debug_struct("Defun")
            .field("shape", &shape)
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("interactive", &self.interactive_spec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(_env: &Env, a: i64, b: i64) -> i64 {
        a + b
    }

    fn arity_of<F: UniversalFn<Sig>, Sig>(_func: &F) -> usize {
        F::ARITY
    }

    fn head<'e>(env: &'e Env, list: Value<'e>) -> LispResult<'e, Value<'e>> {
        env.call("car", (list,))
    }

    #[test]
    fn test_universal_arity() {
        assert_eq!(arity_of(&add), 2);
        assert_eq!(arity_of(&head), 1);
        assert_eq!(arity_of(&|_: &Env| ()), 0);
        assert_eq!(
            arity_of(&|_: &Env, _: u8, _: u8, _: u8, _: u8, _: u8, _: u8, _: u8, _: String| 1.5_f64),
            8
        );
    }

    #[test]
    fn test_descriptor_accessors() {
        let defun = Defun::universal("my-add", "Add.", add).interactive("nA: \nnB: ");
        assert_eq!(defun.name(), "my-add");
        assert_eq!(defun.doc(), "Add.");
        assert_eq!(defun.arity(), (2, Some(2)));
        assert_eq!(defun.interactive_spec(), Some("nA: \nnB: "));

        fn identity<'e>(_env: &'e Env, args: &[Value<'e>]) -> LispResult<'e, Value<'e>> {
            Expected::Value(args[0])
        }
        let defun = Defun::wrapped("my-identity", "", 1, None, identity);
        assert_eq!(defun.arity(), (1, None));
        assert_eq!(defun.interactive_spec(), None);
        assert!(format!("{defun:?}").contains("Wrapped"));
    }
}
